#![forbid(unsafe_code)]

use dsx_contracts::negotiation::{ContractNegotiation, ContractRequest, NegotiationState};
use dsx_contracts::transfer::created_id;
use dsx_engines::rejection_hint::SubmissionStage;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::FlowError;
use crate::session::{ExchangeSession, SelectedOffer};
use crate::transport::ConnectorTransport;

const NEGOTIATIONS_PATH: &str = "/management/v3/contractnegotiations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOutcome {
    pub negotiation_id: String,
    pub agreement_id: String,
    pub polls: u16,
    /// Distinct states seen while polling, in order.
    pub observed_states: Vec<NegotiationState>,
}

pub struct NegotiationOrchestrator<'a> {
    transport: &'a dyn ConnectorTransport,
    retry: RetryPolicy,
    short_circuit_on_terminal_failure: bool,
}

impl<'a> NegotiationOrchestrator<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            short_circuit_on_terminal_failure: true,
        }
    }

    pub fn with_terminal_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit_on_terminal_failure = enabled;
        self
    }

    /// Submits the contract request and polls until an agreement exists.
    pub fn negotiate(
        &self,
        session: &mut ExchangeSession,
        offer: &SelectedOffer,
    ) -> Result<NegotiationOutcome, FlowError> {
        let negotiation_id = self.submit(offer)?;
        session.begin_negotiation(&negotiation_id, offer);
        let outcome = self.await_agreement(&negotiation_id)?;
        session.record_agreement(&outcome.agreement_id)?;
        Ok(outcome)
    }

    pub fn submit(&self, offer: &SelectedOffer) -> Result<String, FlowError> {
        let request = ContractRequest::v1(offer.counterparty_address.clone(), offer.policy.clone())?;
        info!(
            offer = %offer.offer_id,
            dataset = %offer.dataset_id,
            counterparty = %offer.counterparty_address,
            "starting negotiation"
        );
        let reply = self
            .transport
            .post_management(NEGOTIATIONS_PATH, &request.to_json())?;
        if !reply.is_created() {
            warn!(status = reply.status, "negotiation request rejected");
            return Err(FlowError::rejected(SubmissionStage::StartNegotiation, &reply));
        }
        reply
            .json()
            .as_ref()
            .and_then(created_id)
            .ok_or_else(|| FlowError::MalformedResponse {
                stage: "start negotiation",
                detail: "response carries no negotiation id".to_string(),
            })
    }

    /// Transport errors and non-200 answers count as "not yet" and use up
    /// an attempt. `FINALIZED` always ends the loop.
    pub fn await_agreement(&self, negotiation_id: &str) -> Result<NegotiationOutcome, FlowError> {
        let path = format!("{NEGOTIATIONS_PATH}/{negotiation_id}");
        let mut observed_states: Vec<NegotiationState> = Vec::new();

        for attempt in 1..=self.retry.max_attempts {
            self.retry.pause();
            debug!(negotiation = %negotiation_id, attempt, "polling negotiation");
            let reply = match self.transport.get_management(&path) {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(negotiation = %negotiation_id, attempt, error = %err, "negotiation poll failed");
                    continue;
                }
            };
            if !reply.is_ok() {
                warn!(negotiation = %negotiation_id, attempt, status = reply.status, "negotiation poll not ok");
                continue;
            }
            let Some(body) = reply.json() else {
                warn!(negotiation = %negotiation_id, attempt, "negotiation poll body is not JSON");
                continue;
            };
            let status = ContractNegotiation::from_json(&body);
            if observed_states.last() != Some(&status.state) {
                info!(negotiation = %negotiation_id, state = status.state.as_str(), "negotiation state");
                observed_states.push(status.state.clone());
            }

            if status.state.is_finalized() {
                match status.contract_agreement_id {
                    Some(agreement_id) => {
                        info!(negotiation = %negotiation_id, agreement = %agreement_id, "agreement reached");
                        return Ok(NegotiationOutcome {
                            negotiation_id: negotiation_id.to_string(),
                            agreement_id,
                            polls: attempt,
                            observed_states,
                        });
                    }
                    None => {
                        warn!(negotiation = %negotiation_id, "finalized without agreement id");
                        return Err(FlowError::MalformedResponse {
                            stage: "negotiation status",
                            detail: format!(
                                "negotiation {negotiation_id} is FINALIZED but carries no contractAgreementId"
                            ),
                        });
                    }
                }
            }
            if self.short_circuit_on_terminal_failure && status.state.is_terminal_failure() {
                warn!(negotiation = %negotiation_id, state = status.state.as_str(), "negotiation ended");
                return Err(FlowError::NegotiationTerminated {
                    negotiation_id: negotiation_id.to_string(),
                    state: status.state.as_str().to_string(),
                    error_detail: status.error_detail,
                });
            }
        }

        let last_state = observed_states
            .last()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(negotiation = %negotiation_id, attempts = self.retry.max_attempts, "negotiation timed out");
        Err(FlowError::NegotiationTimeout {
            negotiation_id: negotiation_id.to_string(),
            attempts: self.retry.max_attempts,
            last_state,
        })
    }
}
