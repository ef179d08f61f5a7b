#![forbid(unsafe_code)]

use dsx_contracts::catalog::{AccessibleOffer, CatalogPartition, ProviderTarget};
use dsx_contracts::negotiation::{complete_offer_policy, fallback_offer_policy};
use dsx_contracts::transfer::EndpointDataReference;
use serde_json::Value;

use crate::error::FlowError;

/// Offer chosen for negotiation, with the policy already completed for
/// submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedOffer {
    pub offer_id: String,
    pub dataset_id: String,
    pub counterparty_address: String,
    pub policy: Value,
}

impl SelectedOffer {
    pub fn from_catalog(offer: &AccessibleOffer, provider: &ProviderTarget) -> Self {
        Self {
            offer_id: offer.offer_id.clone(),
            dataset_id: offer.dataset_id.clone(),
            counterparty_address: provider.protocol_endpoint.clone(),
            policy: complete_offer_policy(
                &offer.offer,
                &provider.participant_id,
                &offer.dataset_id,
            ),
        }
    }

    /// An offer named by id without a fetched catalog.
    pub fn fallback(
        offer_id: &str,
        dataset_id: &str,
        provider_participant_id: &str,
        counterparty_address: &str,
    ) -> Self {
        Self {
            offer_id: offer_id.to_string(),
            dataset_id: dataset_id.to_string(),
            counterparty_address: counterparty_address.to_string(),
            policy: fallback_offer_policy(offer_id, provider_participant_id, dataset_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementRecord {
    pub negotiation_id: String,
    pub agreement_id: String,
    pub dataset_id: String,
    pub counterparty_address: String,
}

/// State carried between consumer stages for one operator session.
///
/// Each stage overwrites what it owns and clears whatever depends on it, so
/// a new negotiation never leaves a stale transfer or EDR behind.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSession {
    participant_id: String,
    provider: Option<ProviderTarget>,
    offers: Vec<AccessibleOffer>,
    negotiation_id: Option<String>,
    negotiated_offer: Option<SelectedOffer>,
    agreement: Option<AgreementRecord>,
    transfer_id: Option<String>,
    edr: Option<EndpointDataReference>,
}

impl ExchangeSession {
    pub fn new(participant_id: &str) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            ..Self::default()
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Keeps the accessible offers of a partitioned catalog for
    /// `select_offer`.
    pub fn record_catalog(&mut self, provider: ProviderTarget, partition: &CatalogPartition) {
        self.offers = partition.accessible_offer_index();
        self.provider = Some(provider);
    }

    pub fn accessible_offers(&self) -> &[AccessibleOffer] {
        &self.offers
    }

    /// Picks an accessible offer from the last catalog; the first one when
    /// no id is given.
    pub fn select_offer(&self, offer_id: Option<&str>) -> Result<SelectedOffer, FlowError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(FlowError::MissingPrecondition("fetch a catalog first"))?;
        let offer = match offer_id {
            Some(id) => self.offers.iter().find(|o| o.offer_id == id).ok_or(
                FlowError::MissingPrecondition("offer id is not among the accessible offers"),
            )?,
            None => self
                .offers
                .first()
                .ok_or(FlowError::MissingPrecondition("the catalog has no accessible offers"))?,
        };
        Ok(SelectedOffer::from_catalog(offer, provider))
    }

    pub fn begin_negotiation(&mut self, negotiation_id: &str, offer: &SelectedOffer) {
        self.negotiation_id = Some(negotiation_id.to_string());
        self.negotiated_offer = Some(offer.clone());
        self.agreement = None;
        self.transfer_id = None;
        self.edr = None;
    }

    pub fn negotiation_id(&self) -> Option<&str> {
        self.negotiation_id.as_deref()
    }

    pub fn record_agreement(&mut self, agreement_id: &str) -> Result<&AgreementRecord, FlowError> {
        let (Some(negotiation_id), Some(offer)) = (&self.negotiation_id, &self.negotiated_offer)
        else {
            return Err(FlowError::MissingPrecondition("no negotiation in progress"));
        };
        let record = AgreementRecord {
            negotiation_id: negotiation_id.clone(),
            agreement_id: agreement_id.to_string(),
            dataset_id: offer.dataset_id.clone(),
            counterparty_address: offer.counterparty_address.clone(),
        };
        Ok(self.agreement.insert(record))
    }

    pub fn agreement(&self) -> Option<&AgreementRecord> {
        self.agreement.as_ref()
    }

    pub fn begin_transfer(&mut self, transfer_id: &str) {
        self.transfer_id = Some(transfer_id.to_string());
        self.edr = None;
    }

    pub fn transfer_id(&self) -> Option<&str> {
        self.transfer_id.as_deref()
    }

    pub fn record_edr(&mut self, edr: EndpointDataReference) {
        self.edr = Some(edr);
    }

    pub fn edr(&self) -> Option<&EndpointDataReference> {
        self.edr.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsx_contracts::catalog::{DatasetAccess, EvaluatedOffer};
    use dsx_contracts::policy::{PolicyDecisionBasis, PolicyEvaluation};
    use serde_json::json;

    fn provider() -> ProviderTarget {
        ProviderTarget::v1("provider.example", None, 19194).unwrap()
    }

    fn partition(offer_ids: &[&str]) -> CatalogPartition {
        CatalogPartition {
            accessible_datasets: vec![DatasetAccess {
                dataset_id: "asset-1".to_string(),
                title: None,
                keywords: vec![],
                accessible_offers: offer_ids
                    .iter()
                    .map(|id| EvaluatedOffer {
                        offer_id: id.to_string(),
                        offer: json!({"@id": id}),
                        evaluation: PolicyEvaluation::allow(
                            PolicyDecisionBasis::NoPermissions,
                            "no permissions defined",
                        ),
                    })
                    .collect(),
                blocked_offers: vec![],
            }],
            blocked_datasets: vec![],
        }
    }

    fn edr() -> EndpointDataReference {
        EndpointDataReference {
            endpoint: "http://dp/public".to_string(),
            authorization: "token".to_string(),
        }
    }

    #[test]
    fn at_session_01_select_requires_catalog() {
        let session = ExchangeSession::new("me");
        assert!(matches!(
            session.select_offer(None),
            Err(FlowError::MissingPrecondition(_))
        ));
    }

    #[test]
    fn at_session_02_select_first_or_named_offer() {
        let mut session = ExchangeSession::new("me");
        session.record_catalog(provider(), &partition(&["o1", "o2"]));
        let first = session.select_offer(None).unwrap();
        assert_eq!(first.offer_id, "o1");
        assert_eq!(first.counterparty_address, "http://provider.example:19194/protocol");
        assert_eq!(first.policy["odrl:assigner"], json!({"@id": "provider.example"}));
        assert_eq!(first.policy["odrl:target"], json!({"@id": "asset-1"}));
        assert_eq!(session.select_offer(Some("o2")).unwrap().offer_id, "o2");
        assert!(session.select_offer(Some("o9")).is_err());
    }

    #[test]
    fn at_session_03_new_negotiation_clears_downstream_state() {
        let mut session = ExchangeSession::new("me");
        session.record_catalog(provider(), &partition(&["o1"]));
        let offer = session.select_offer(None).unwrap();
        session.begin_negotiation("neg-1", &offer);
        session.record_agreement("agr-1").unwrap();
        session.begin_transfer("tp-1");
        session.record_edr(edr());

        session.begin_negotiation("neg-2", &offer);
        assert_eq!(session.negotiation_id(), Some("neg-2"));
        assert!(session.agreement().is_none());
        assert!(session.transfer_id().is_none());
        assert!(session.edr().is_none());
    }

    #[test]
    fn at_session_04_agreement_carries_negotiated_offer() {
        let mut session = ExchangeSession::new("me");
        assert!(session.record_agreement("agr-1").is_err());
        let offer = SelectedOffer::fallback("offer-x", "asset-9", "prov", "http://prov:19194/protocol");
        session.begin_negotiation("neg-1", &offer);
        let agreement = session.record_agreement("agr-1").unwrap().clone();
        assert_eq!(agreement.dataset_id, "asset-9");
        assert_eq!(agreement.counterparty_address, "http://prov:19194/protocol");
        assert_eq!(session.agreement(), Some(&agreement));
    }

    #[test]
    fn at_session_05_new_transfer_clears_edr_only() {
        let mut session = ExchangeSession::new("me");
        let offer = SelectedOffer::fallback("o", "a", "p", "http://p:19194/protocol");
        session.begin_negotiation("neg-1", &offer);
        session.record_agreement("agr-1").unwrap();
        session.begin_transfer("tp-1");
        session.record_edr(edr());
        session.begin_transfer("tp-2");
        assert_eq!(session.transfer_id(), Some("tp-2"));
        assert!(session.edr().is_none());
        assert!(session.agreement().is_some());
    }
}
