#![forbid(unsafe_code)]

use dsx_contracts::fetch::FetchFailure;
use dsx_contracts::ContractViolation;
use dsx_engines::rejection_hint::{rejection_hint, SubmissionStage};
use thiserror::Error;

use crate::transport::HttpReply;

/// A call that never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error calling {target}: {detail}")]
pub struct TransportError {
    pub kind: &'static str,
    pub target: String,
    pub detail: String,
}

impl TransportError {
    pub fn new(kind: &'static str, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == "timeout"
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{} rejected with HTTP {status}: {body}", .stage.as_str())]
    Rejected {
        stage: SubmissionStage,
        status: u16,
        body: String,
        hint: Option<&'static str>,
    },

    #[error("unexpected response from {stage}: {detail}")]
    MalformedResponse { stage: &'static str, detail: String },

    #[error(
        "negotiation {negotiation_id} not finalized after {attempts} polls (last state: {last_state})"
    )]
    NegotiationTimeout {
        negotiation_id: String,
        attempts: u16,
        last_state: String,
    },

    #[error("negotiation {negotiation_id} ended in state {state}")]
    NegotiationTerminated {
        negotiation_id: String,
        state: String,
        error_detail: Option<String>,
    },

    #[error("no usable data address for transfer {transfer_id} after {attempts} polls")]
    EdrTimeout { transfer_id: String, attempts: u16 },

    #[error("{}", .0.guidance())]
    Fetch(FetchFailure),

    #[error("missing precondition: {0}")]
    MissingPrecondition(&'static str),

    #[error("invalid request document: {0}")]
    Contract(#[from] ContractViolation),
}

impl FlowError {
    /// A non-success answer to a submission, with a hint when the body
    /// matches a known problem.
    pub fn rejected(stage: SubmissionStage, reply: &HttpReply) -> Self {
        FlowError::Rejected {
            stage,
            status: reply.status,
            body: reply.body.clone(),
            hint: rejection_hint(stage, &reply.body),
        }
    }

    /// Follow-up advice to show next to the error message.
    pub fn hint(&self) -> Option<&str> {
        match self {
            FlowError::Rejected { hint, .. } => *hint,
            FlowError::NegotiationTerminated { error_detail, .. } => error_detail.as_deref(),
            FlowError::NegotiationTimeout { .. } => {
                Some("the provider may still finalize; run `dsx negotiate` again if it never does")
            }
            FlowError::EdrTimeout { .. } => {
                Some("the transfer id is kept; resume with `dsx pull --transfer-id <transfer id>`")
            }
            FlowError::Transport(err) if err.is_timeout() => {
                Some("the connector did not answer in time; check that it is running")
            }
            FlowError::Transport(_) => Some("check that the connector is reachable"),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            FlowError::NegotiationTimeout { .. } | FlowError::EdrTimeout { .. } => true,
            FlowError::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }
}
