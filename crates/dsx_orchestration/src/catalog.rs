#![forbid(unsafe_code)]

use dsx_contracts::catalog::{CatalogPartition, CatalogRequest, ProviderTarget};
use dsx_engines::catalog_filter::filter_catalog;
use dsx_engines::rejection_hint::SubmissionStage;
use tracing::{info, warn};

use crate::error::FlowError;
use crate::session::ExchangeSession;
use crate::transport::ConnectorTransport;

const CATALOG_REQUEST_PATH: &str = "/management/v3/catalog/request";

pub struct CatalogRequester<'a> {
    transport: &'a dyn ConnectorTransport,
    protocol_port: u16,
}

impl<'a> CatalogRequester<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport, protocol_port: u16) -> Self {
        Self {
            transport,
            protocol_port,
        }
    }

    /// Fetches the provider's catalog through our connector and partitions
    /// it for the session participant. The accessible offers are kept in
    /// the session.
    pub fn fetch(
        &self,
        session: &mut ExchangeSession,
        provider_fqdn: &str,
        provider_participant_id: Option<&str>,
    ) -> Result<CatalogPartition, FlowError> {
        let provider = ProviderTarget::v1(provider_fqdn, provider_participant_id, self.protocol_port)?;
        let request = CatalogRequest::for_provider(&provider);
        info!(provider = %provider.fqdn, endpoint = %provider.protocol_endpoint, "requesting catalog");

        let reply = self
            .transport
            .post_management(CATALOG_REQUEST_PATH, &request.to_json())?;
        if !reply.is_ok() {
            warn!(status = reply.status, "catalog request rejected");
            return Err(FlowError::rejected(SubmissionStage::FetchCatalog, &reply));
        }
        let catalog = reply.json().ok_or_else(|| FlowError::MalformedResponse {
            stage: "catalog",
            detail: "catalog response is not JSON".to_string(),
        })?;

        let partition = filter_catalog(&catalog, session.participant_id());
        info!(
            accessible = partition.accessible_datasets.len(),
            blocked = partition.blocked_datasets.len(),
            "catalog partitioned"
        );
        session.record_catalog(provider, &partition);
        Ok(partition)
    }
}
