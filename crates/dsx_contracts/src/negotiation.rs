#![forbid(unsafe_code)]

use serde_json::{json, Value};

use crate::common::{validate_http_url, validate_identifier};
use crate::jsonld::{id_ref, negotiation_context, node_id, DATASPACE_PROTOCOL};
use crate::policy::{KEY_ASSIGNER, KEY_OBLIGATION, KEY_PERMISSION, KEY_PROHIBITION, KEY_TARGET};
use crate::{ContractViolation, Validate};

pub const STATE_FINALIZED: &str = "FINALIZED";

/// Contract negotiation states reported by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Initial,
    Requesting,
    Requested,
    Offering,
    Offered,
    Accepting,
    Accepted,
    Agreeing,
    Agreed,
    Verifying,
    Verified,
    Finalizing,
    Finalized,
    Terminating,
    Terminated,
    Other(String),
}

impl NegotiationState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "INITIAL" => NegotiationState::Initial,
            "REQUESTING" => NegotiationState::Requesting,
            "REQUESTED" => NegotiationState::Requested,
            "OFFERING" => NegotiationState::Offering,
            "OFFERED" => NegotiationState::Offered,
            "ACCEPTING" => NegotiationState::Accepting,
            "ACCEPTED" => NegotiationState::Accepted,
            "AGREEING" => NegotiationState::Agreeing,
            "AGREED" => NegotiationState::Agreed,
            "VERIFYING" => NegotiationState::Verifying,
            "VERIFIED" => NegotiationState::Verified,
            "FINALIZING" => NegotiationState::Finalizing,
            STATE_FINALIZED => NegotiationState::Finalized,
            "TERMINATING" => NegotiationState::Terminating,
            "TERMINATED" => NegotiationState::Terminated,
            other => NegotiationState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NegotiationState::Initial => "INITIAL",
            NegotiationState::Requesting => "REQUESTING",
            NegotiationState::Requested => "REQUESTED",
            NegotiationState::Offering => "OFFERING",
            NegotiationState::Offered => "OFFERED",
            NegotiationState::Accepting => "ACCEPTING",
            NegotiationState::Accepted => "ACCEPTED",
            NegotiationState::Agreeing => "AGREEING",
            NegotiationState::Agreed => "AGREED",
            NegotiationState::Verifying => "VERIFYING",
            NegotiationState::Verified => "VERIFIED",
            NegotiationState::Finalizing => "FINALIZING",
            NegotiationState::Finalized => STATE_FINALIZED,
            NegotiationState::Terminating => "TERMINATING",
            NegotiationState::Terminated => "TERMINATED",
            NegotiationState::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, NegotiationState::Finalized)
    }

    /// States from which the negotiation can no longer reach `FINALIZED`.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            NegotiationState::Terminating | NegotiationState::Terminated
        ) || matches!(self, NegotiationState::Other(raw) if raw == "DECLINED")
    }
}

/// Status document returned by `GET /contractnegotiations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractNegotiation {
    pub id: Option<String>,
    pub state: NegotiationState,
    pub contract_agreement_id: Option<String>,
    pub error_detail: Option<String>,
}

impl ContractNegotiation {
    pub fn from_json(body: &Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            id: node_id(body).map(str::to_string),
            state: NegotiationState::parse(body.get("state").and_then(Value::as_str).unwrap_or("")),
            contract_agreement_id: text("contractAgreementId"),
            error_detail: text("errorDetail"),
        }
    }
}

/// Completes a catalog offer so that the provider accepts it as a contract
/// request policy: the assigner defaults to the provider participant and the
/// target to the dataset. Everything else is passed through untouched.
pub fn complete_offer_policy(offer: &Value, provider_participant_id: &str, dataset_id: &str) -> Value {
    let mut policy = offer.clone();
    if let Some(obj) = policy.as_object_mut() {
        if !obj.contains_key(KEY_ASSIGNER) {
            obj.insert(KEY_ASSIGNER.to_string(), id_ref(provider_participant_id));
        }
        if !obj.contains_key(KEY_TARGET) {
            obj.insert(KEY_TARGET.to_string(), id_ref(dataset_id));
        }
    }
    policy
}

/// Offer used when the operator names an offer id that was not part of a
/// fetched catalog.
pub fn fallback_offer_policy(offer_id: &str, provider_participant_id: &str, dataset_id: &str) -> Value {
    json!({
        "@id": offer_id,
        "@type": "odrl:Offer",
        KEY_ASSIGNER: id_ref(provider_participant_id),
        KEY_TARGET: id_ref(dataset_id),
        KEY_PERMISSION: [{"odrl:action": {"@id": "USE"}}],
        KEY_PROHIBITION: [],
        KEY_OBLIGATION: [],
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractRequest {
    pub counterparty_address: String,
    pub policy: Value,
}

impl ContractRequest {
    pub fn v1(counterparty_address: String, policy: Value) -> Result<Self, ContractViolation> {
        let req = Self {
            counterparty_address,
            policy,
        };
        req.validate()?;
        Ok(req)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "@context": negotiation_context(),
            "@type": "ContractRequest",
            "counterPartyAddress": self.counterparty_address,
            "protocol": DATASPACE_PROTOCOL,
            "policy": self.policy,
        })
    }
}

impl Validate for ContractRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_http_url(
            "contract_request.counterparty_address",
            &self.counterparty_address,
        )?;
        if !self.policy.is_object() {
            return Err(ContractViolation::InvalidValue {
                field: "contract_request.policy",
                reason: "must be a JSON object",
            });
        }
        if let Some(id) = node_id(&self.policy) {
            validate_identifier("contract_request.policy.@id", id, 1024)?;
        }
        Ok(())
    }
}
