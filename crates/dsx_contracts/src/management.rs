#![forbid(unsafe_code)]

//! Provider-side documents: assets, policy definitions and contract
//! definitions, plus the summaries shown when listing them.

use serde::Serialize;
use serde_json::{json, Value};

use crate::common::{validate_http_url, validate_identifier};
use crate::jsonld::{
    node_id, one_or_many, vocab_context, vocab_context_with_odrl, ODRL_CONTEXT_URL,
};
use crate::policy::{
    PolicyDocument, KEY_OBLIGATION, KEY_PERMISSION, KEY_PROHIBITION, PARTICIPANT_ID_LEFT_OPERAND,
};
use crate::{ContractViolation, Validate};

pub const ASSET_ID_OPERAND: &str = "https://w3id.org/edc/v0.0.1/ns/id";

const MAX_ID_LEN: usize = 256;
const MAX_TEXT_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementResource {
    Assets,
    PolicyDefinitions,
    ContractDefinitions,
}

impl ManagementResource {
    pub fn path(self) -> &'static str {
        match self {
            ManagementResource::Assets => "/management/v3/assets",
            ManagementResource::PolicyDefinitions => "/management/v3/policydefinitions",
            ManagementResource::ContractDefinitions => "/management/v3/contractdefinitions",
        }
    }

    pub fn query_path(self) -> String {
        format!("{}/request", self.path())
    }

    pub fn label(self) -> &'static str {
        match self {
            ManagementResource::Assets => "asset",
            ManagementResource::PolicyDefinitions => "policy definition",
            ManagementResource::ContractDefinitions => "contract definition",
        }
    }
}

/// An HTTP-addressable asset published through the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDocument {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_url: String,
}

impl AssetDocument {
    pub fn v1(
        id: String,
        name: String,
        description: String,
        base_url: String,
    ) -> Result<Self, ContractViolation> {
        let doc = Self {
            id,
            name,
            description,
            base_url,
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "@context": vocab_context(),
            "@type": "Asset",
            "@id": self.id,
            "properties": {
                "name": self.name,
                "description": self.description,
            },
            "dataAddress": {
                "@type": "DataAddress",
                "type": "HttpData",
                "baseUrl": self.base_url,
            },
        })
    }
}

impl Validate for AssetDocument {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_identifier("asset.id", &self.id, MAX_ID_LEN)?;
        if self.name.len() > MAX_TEXT_LEN || self.description.len() > MAX_TEXT_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "asset.properties",
                reason: "name/description exceed max length",
            });
        }
        validate_http_url("asset.data_address.base_url", &self.base_url)
    }
}

/// A `USE` policy, optionally restricted to one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDefinitionDocument {
    pub id: String,
    pub allowed_participant: Option<String>,
}

impl PolicyDefinitionDocument {
    pub fn v1(id: String, allowed_participant: Option<String>) -> Result<Self, ContractViolation> {
        let doc = Self {
            id,
            allowed_participant: allowed_participant
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        let permission = match &self.allowed_participant {
            Some(participant) => json!({
                "odrl:action": "USE",
                "odrl:constraint": {
                    "@type": "AtomicConstraint",
                    "odrl:leftOperand": PARTICIPANT_ID_LEFT_OPERAND,
                    "odrl:operator": {"@id": "odrl:eq"},
                    "odrl:rightOperand": participant,
                },
            }),
            None => json!({"odrl:action": "USE"}),
        };
        json!({
            "@context": vocab_context_with_odrl(),
            "@type": "PolicyDefinition",
            "@id": self.id,
            "policy": {
                "@context": ODRL_CONTEXT_URL,
                "@type": "http://www.w3.org/ns/odrl/2/Set",
                KEY_PERMISSION: [permission],
                KEY_PROHIBITION: [],
                KEY_OBLIGATION: [],
            },
        })
    }
}

impl Validate for PolicyDefinitionDocument {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_identifier("policy_definition.id", &self.id, MAX_ID_LEN)?;
        if let Some(participant) = &self.allowed_participant {
            validate_identifier(
                "policy_definition.allowed_participant",
                participant,
                MAX_ID_LEN,
            )?;
        }
        Ok(())
    }
}

/// Binds one asset to an access policy and a contract policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDefinitionDocument {
    pub id: String,
    pub access_policy_id: String,
    pub contract_policy_id: String,
    pub asset_id: String,
}

impl ContractDefinitionDocument {
    pub fn v1(
        id: String,
        access_policy_id: String,
        contract_policy_id: String,
        asset_id: String,
    ) -> Result<Self, ContractViolation> {
        let doc = Self {
            id,
            access_policy_id,
            contract_policy_id,
            asset_id,
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "@context": vocab_context(),
            "@type": "ContractDefinition",
            "@id": self.id,
            "accessPolicyId": self.access_policy_id,
            "contractPolicyId": self.contract_policy_id,
            "assetsSelector": [{
                "@type": "CriterionDto",
                "operandLeft": ASSET_ID_OPERAND,
                "operator": "=",
                "operandRight": self.asset_id,
            }],
        })
    }
}

impl Validate for ContractDefinitionDocument {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_identifier("contract_definition.id", &self.id, MAX_ID_LEN)?;
        validate_identifier(
            "contract_definition.access_policy_id",
            &self.access_policy_id,
            MAX_ID_LEN,
        )?;
        validate_identifier(
            "contract_definition.contract_policy_id",
            &self.contract_policy_id,
            MAX_ID_LEN,
        )?;
        validate_identifier("contract_definition.asset_id", &self.asset_id, MAX_ID_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub id: String,
    pub name: Option<String>,
}

impl AssetSummary {
    pub fn from_json(node: &Value) -> Self {
        Self {
            id: node_id(node).unwrap_or("N/A").to_string(),
            name: node
                .pointer("/properties/name")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    pub id: String,
    pub restricted_to: Option<String>,
}

impl PolicySummary {
    pub fn from_json(node: &Value) -> Self {
        let policy = node.get("policy").map(PolicyDocument::from_json).unwrap_or_default();
        Self {
            id: node_id(node).unwrap_or("N/A").to_string(),
            restricted_to: policy
                .participant_restriction()
                .and_then(|c| c.right_operand.clone()),
        }
    }

    pub fn is_participant_restricted(&self) -> bool {
        self.restricted_to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractDefinitionSummary {
    pub id: String,
    pub access_policy_id: String,
    pub contract_policy_id: String,
    pub asset_ids: Vec<String>,
    pub created_at: Option<String>,
}

impl ContractDefinitionSummary {
    pub fn from_json(node: &Value) -> Self {
        let text = |key: &str| {
            node.get(key)
                .and_then(Value::as_str)
                .unwrap_or("N/A")
                .to_string()
        };
        let asset_ids = one_or_many(node.get("assetsSelector"))
            .into_iter()
            .filter(|sel| {
                sel.get("operandLeft").and_then(Value::as_str) == Some(ASSET_ID_OPERAND)
            })
            .map(|sel| {
                sel.get("operandRight")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_string()
            })
            .collect();
        let created_at = match node.get("createdAt") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        Self {
            id: text("@id"),
            access_policy_id: text("accessPolicyId"),
            contract_policy_id: text("contractPolicyId"),
            asset_ids,
            created_at,
        }
    }
}
