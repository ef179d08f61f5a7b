#![forbid(unsafe_code)]

use std::thread;
use std::time::Duration;

use dsx_contracts::transfer::EndpointDataReference;
use dsx_engines::edr_endpoint::resolve_endpoint_placeholder;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::FlowError;
use crate::session::ExchangeSession;
use crate::transport::ConnectorTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdr {
    pub edr: EndpointDataReference,
    /// Set when the connector returned an unresolved `${NAME:default}`.
    pub placeholder_variable: Option<String>,
    pub polls: u16,
}

pub struct EdrResolver<'a> {
    transport: &'a dyn ConnectorTransport,
    retry: RetryPolicy,
    settle: Duration,
}

impl<'a> EdrResolver<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            settle: Duration::ZERO,
        }
    }

    /// Wait once before the first poll; a fresh transfer rarely has its
    /// data address yet.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn resolve(&self, session: &mut ExchangeSession) -> Result<ResolvedEdr, FlowError> {
        let transfer_id = session
            .transfer_id()
            .ok_or(FlowError::MissingPrecondition("start a transfer first"))?
            .to_string();
        let resolved = self.resolve_edr(&transfer_id)?;
        session.record_edr(resolved.edr.clone());
        Ok(resolved)
    }

    /// Anything short of a 200 with both fields set means "not ready".
    pub fn resolve_edr(&self, transfer_id: &str) -> Result<ResolvedEdr, FlowError> {
        let path = format!("/management/v3/edrs/{transfer_id}/dataaddress");
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        for attempt in 1..=self.retry.max_attempts {
            self.retry.pause();
            debug!(transfer = %transfer_id, attempt, "polling data address");
            let reply = match self.transport.get_management(&path) {
                Ok(reply) => reply,
                Err(err) => {
                    debug!(transfer = %transfer_id, attempt, error = %err, "data address poll failed");
                    continue;
                }
            };
            if !reply.is_ok() {
                debug!(transfer = %transfer_id, attempt, status = reply.status, "data address not ready");
                continue;
            }
            let Some(raw) = reply.json().as_ref().and_then(EndpointDataReference::from_json) else {
                debug!(transfer = %transfer_id, attempt, "data address incomplete");
                continue;
            };

            let endpoint = resolve_endpoint_placeholder(&raw.endpoint);
            if endpoint.endpoint.trim().is_empty() {
                debug!(transfer = %transfer_id, attempt, "data address endpoint resolved empty");
                continue;
            }
            if let Some(variable) = &endpoint.placeholder_variable {
                warn!(variable = %variable, endpoint = %endpoint.endpoint, "connector returned a templated endpoint; using its default");
            }
            let edr = EndpointDataReference {
                endpoint: endpoint.endpoint,
                authorization: raw.authorization,
            };
            info!(
                transfer = %transfer_id,
                endpoint = %edr.endpoint,
                authorization = %edr.credential_preview(),
                "data address ready"
            );
            return Ok(ResolvedEdr {
                edr,
                placeholder_variable: endpoint.placeholder_variable,
                polls: attempt,
            });
        }

        warn!(transfer = %transfer_id, attempts = self.retry.max_attempts, "data address timed out");
        Err(FlowError::EdrTimeout {
            transfer_id: transfer_id.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}
