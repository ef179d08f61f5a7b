#![forbid(unsafe_code)]

use serde_json::{json, Value};

use crate::common::{validate_http_url, validate_identifier};
use crate::jsonld::{node_id, vocab_context, DATASPACE_PROTOCOL};
use crate::{ContractViolation, Validate};

pub const TRANSFER_TYPE_HTTP_PULL: &str = "HttpData-PULL";
pub const DESTINATION_TYPE_HTTP_PROXY: &str = "HttpProxy";

const CREDENTIAL_PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub counterparty_address: String,
    pub contract_id: String,
    pub asset_id: String,
}

impl TransferRequest {
    pub fn v1(
        counterparty_address: String,
        contract_id: String,
        asset_id: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            counterparty_address,
            contract_id,
            asset_id,
        };
        req.validate()?;
        Ok(req)
    }

    /// Pull transfer through the provider's data-plane proxy; the destination
    /// carries only its type.
    pub fn to_json(&self) -> Value {
        json!({
            "@context": vocab_context(),
            "@type": "TransferRequest",
            "counterPartyAddress": self.counterparty_address,
            "protocol": DATASPACE_PROTOCOL,
            "contractId": self.contract_id,
            "assetId": self.asset_id,
            "transferType": TRANSFER_TYPE_HTTP_PULL,
            "dataDestination": {
                "@type": "DataAddress",
                "type": DESTINATION_TYPE_HTTP_PROXY,
            },
        })
    }
}

impl Validate for TransferRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_http_url(
            "transfer_request.counterparty_address",
            &self.counterparty_address,
        )?;
        validate_identifier("transfer_request.contract_id", &self.contract_id, 1024)?;
        validate_identifier("transfer_request.asset_id", &self.asset_id, 256)?;
        Ok(())
    }
}

/// Created-resource response (`{"@id": ...}`) of the management API.
pub fn created_id(body: &Value) -> Option<String> {
    node_id(body)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
}

/// Short-lived access to transferred data. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointDataReference {
    pub endpoint: String,
    pub authorization: String,
}

impl EndpointDataReference {
    /// Both fields must be present and non-empty, otherwise the EDR is not
    /// ready yet.
    pub fn from_json(body: &Value) -> Option<Self> {
        let field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };
        Some(Self {
            endpoint: field("endpoint")?,
            authorization: field("authorization")?,
        })
    }

    pub fn credential_preview(&self) -> String {
        preview_secret(&self.authorization)
    }
}

impl std::fmt::Debug for EndpointDataReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDataReference")
            .field("endpoint", &self.endpoint)
            .field("authorization", &self.credential_preview())
            .finish()
    }
}

pub fn preview_secret(secret: &str) -> String {
    if secret.chars().count() <= CREDENTIAL_PREVIEW_CHARS {
        return secret.to_string();
    }
    let head: String = secret.chars().take(CREDENTIAL_PREVIEW_CHARS).collect();
    format!("{head}...")
}
