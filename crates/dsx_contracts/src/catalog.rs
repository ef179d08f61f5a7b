#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::{json, Value};

use crate::common::{validate_identifier, validate_http_url};
use crate::jsonld::{
    node_id, one_or_many, one_or_many_strings, property, vocab_context, DATASPACE_PROTOCOL,
};
use crate::policy::PolicyEvaluation;
use crate::{ContractViolation, Validate};

pub const KEY_DATASET: &str = "dcat:dataset";
pub const KEY_KEYWORD: &str = "dcat:keyword";
pub const KEY_HAS_POLICY: &str = "odrl:hasPolicy";
pub const KEY_TITLE: &str = "dct:title";

pub const DEFAULT_PROTOCOL_PORT: u16 = 19194;

/// The provider a catalog was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTarget {
    pub fqdn: String,
    pub participant_id: String,
    pub protocol_endpoint: String,
}

impl ProviderTarget {
    /// The participant id defaults to the FQDN, which is how participants
    /// are provisioned in practice.
    pub fn v1(
        fqdn: &str,
        participant_id: Option<&str>,
        protocol_port: u16,
    ) -> Result<Self, ContractViolation> {
        let fqdn = fqdn.trim().to_string();
        let participant_id = participant_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fqdn.as_str())
            .to_string();
        let target = Self {
            protocol_endpoint: format!("http://{fqdn}:{protocol_port}/protocol"),
            fqdn,
            participant_id,
        };
        target.validate()?;
        Ok(target)
    }
}

impl Validate for ProviderTarget {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_identifier("provider_target.fqdn", &self.fqdn, 253)?;
        if self.fqdn.contains(['/', ':', '@', ' ']) {
            return Err(ContractViolation::InvalidValue {
                field: "provider_target.fqdn",
                reason: "must be a bare host name",
            });
        }
        validate_identifier("provider_target.participant_id", &self.participant_id, 256)?;
        validate_http_url("provider_target.protocol_endpoint", &self.protocol_endpoint)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub counterparty_address: String,
}

impl CatalogRequest {
    pub fn for_provider(provider: &ProviderTarget) -> Self {
        Self {
            counterparty_address: provider.protocol_endpoint.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "@context": vocab_context(),
            "@type": "CatalogRequest",
            "counterPartyAddress": self.counterparty_address,
            "protocol": DATASPACE_PROTOCOL,
            "querySpec": {"@type": "QuerySpec"},
        })
    }
}

/// Datasets of a catalog response, singleton-or-list normalized.
pub fn catalog_datasets(catalog: &Value) -> Vec<&Value> {
    one_or_many(property(catalog, KEY_DATASET))
}

/// Offers attached to a dataset, singleton-or-list normalized.
pub fn dataset_offers(dataset: &Value) -> Vec<&Value> {
    one_or_many(property(dataset, KEY_HAS_POLICY))
}

pub fn dataset_keywords(dataset: &Value) -> Vec<String> {
    one_or_many_strings(property(dataset, KEY_KEYWORD))
}

pub fn dataset_title(dataset: &Value) -> Option<String> {
    property(dataset, KEY_TITLE)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// An offer together with its accessibility verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedOffer {
    pub offer_id: String,
    pub offer: Value,
    pub evaluation: PolicyEvaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetAccess {
    pub dataset_id: String,
    pub title: Option<String>,
    pub keywords: Vec<String>,
    pub accessible_offers: Vec<EvaluatedOffer>,
    pub blocked_offers: Vec<EvaluatedOffer>,
}

impl DatasetAccess {
    pub fn is_accessible(&self) -> bool {
        !self.accessible_offers.is_empty()
    }
}

/// An accessible offer flattened out of the partition for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibleOffer {
    pub offer_id: String,
    pub dataset_id: String,
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CatalogPartition {
    pub accessible_datasets: Vec<DatasetAccess>,
    pub blocked_datasets: Vec<DatasetAccess>,
}

impl CatalogPartition {
    pub fn is_empty(&self) -> bool {
        self.accessible_datasets.is_empty() && self.blocked_datasets.is_empty()
    }

    /// Accessible offers keyed by offer id in first-seen order. A later
    /// offer with an id already seen replaces the earlier entry in place.
    pub fn accessible_offer_index(&self) -> Vec<AccessibleOffer> {
        let mut out: Vec<AccessibleOffer> = Vec::new();
        for dataset in &self.accessible_datasets {
            for offer in &dataset.accessible_offers {
                let entry = AccessibleOffer {
                    offer_id: offer.offer_id.clone(),
                    dataset_id: dataset.dataset_id.clone(),
                    offer: offer.offer.clone(),
                };
                match out.iter_mut().find(|o| o.offer_id == entry.offer_id) {
                    Some(existing) => *existing = entry,
                    None => out.push(entry),
                }
            }
        }
        out
    }
}

pub fn dataset_id_or_unknown(dataset: &Value) -> String {
    node_id(dataset).unwrap_or("Unknown ID").to_string()
}
