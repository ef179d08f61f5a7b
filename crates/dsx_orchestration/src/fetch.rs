#![forbid(unsafe_code)]

use dsx_contracts::fetch::FetchedContent;
use dsx_contracts::transfer::EndpointDataReference;
use dsx_engines::fetch_classify::classify_fetch_response;
use tracing::{info, warn};

use crate::error::FlowError;
use crate::session::ExchangeSession;
use crate::transport::ConnectorTransport;

pub struct DataFetcher<'a> {
    transport: &'a dyn ConnectorTransport,
}

impl<'a> DataFetcher<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport) -> Self {
        Self { transport }
    }

    pub fn fetch_for_session(&self, session: &ExchangeSession) -> Result<FetchedContent, FlowError> {
        let edr = session
            .edr()
            .ok_or(FlowError::MissingPrecondition("resolve a data address first"))?;
        self.fetch(edr)
    }

    /// The credential goes into `Authorization` as issued, without a scheme
    /// prefix.
    pub fn fetch(&self, edr: &EndpointDataReference) -> Result<FetchedContent, FlowError> {
        info!(endpoint = %edr.endpoint, "fetching data");
        let reply = self
            .transport
            .get_url(&edr.endpoint, Some(&edr.authorization))?;
        match classify_fetch_response(reply.status, &reply.body) {
            Ok(content) => {
                info!(kind = content.kind().as_str(), bytes = reply.body.len(), "data fetched");
                Ok(content)
            }
            Err(failure) => {
                warn!(status = reply.status, "data fetch failed");
                Err(FlowError::Fetch(failure))
            }
        }
    }
}
