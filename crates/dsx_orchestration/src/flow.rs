#![forbid(unsafe_code)]

//! Consumer pipeline: negotiate, transfer, resolve the data address, fetch.
//!
//! Each stage starts only after the previous one succeeded. A failing stage
//! stops the run; whatever earlier stages recorded stays in the session so
//! the operator can resume from there.

use std::time::Duration;

use dsx_contracts::fetch::FetchedContent;
use tracing::info;

use crate::config::{ConsoleConfig, RetryPolicy};
use crate::edr::{EdrResolver, ResolvedEdr};
use crate::error::FlowError;
use crate::fetch::DataFetcher;
use crate::negotiation::{NegotiationOrchestrator, NegotiationOutcome};
use crate::session::{ExchangeSession, SelectedOffer};
use crate::transfer::TransferOrchestrator;
use crate::transport::ConnectorTransport;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerFlowReport {
    pub negotiation: NegotiationOutcome,
    pub transfer_id: String,
    pub edr: ResolvedEdr,
    pub content: FetchedContent,
}

pub struct ConsumerFlow<'a> {
    transport: &'a dyn ConnectorTransport,
    negotiation_retry: RetryPolicy,
    edr_retry: RetryPolicy,
    edr_settle: Duration,
    short_circuit_on_terminal_failure: bool,
}

impl<'a> ConsumerFlow<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport, config: &ConsoleConfig) -> Self {
        Self {
            transport,
            negotiation_retry: config.negotiation_retry,
            edr_retry: config.edr_retry,
            edr_settle: config.edr_settle,
            short_circuit_on_terminal_failure: config.short_circuit_on_terminal_failure,
        }
    }

    pub fn negotiation(&self) -> NegotiationOrchestrator<'a> {
        NegotiationOrchestrator::new(self.transport, self.negotiation_retry)
            .with_terminal_short_circuit(self.short_circuit_on_terminal_failure)
    }

    pub fn transfer(&self) -> TransferOrchestrator<'a> {
        TransferOrchestrator::new(self.transport)
    }

    pub fn edr(&self) -> EdrResolver<'a> {
        EdrResolver::new(self.transport, self.edr_retry).with_settle_delay(self.edr_settle)
    }

    pub fn fetcher(&self) -> DataFetcher<'a> {
        DataFetcher::new(self.transport)
    }

    pub fn run(
        &self,
        session: &mut ExchangeSession,
        offer: &SelectedOffer,
    ) -> Result<ConsumerFlowReport, FlowError> {
        info!(offer = %offer.offer_id, dataset = %offer.dataset_id, "consumer flow started");
        let negotiation = self.negotiation().negotiate(session, offer)?;
        let transfer_id = self.transfer().start(session)?;
        let edr = self.edr().resolve(session)?;
        let content = self.fetcher().fetch_for_session(session)?;
        info!(
            agreement = %negotiation.agreement_id,
            transfer = %transfer_id,
            kind = content.kind().as_str(),
            "consumer flow finished"
        );
        Ok(ConsumerFlowReport {
            negotiation,
            transfer_id,
            edr,
            content,
        })
    }
}
