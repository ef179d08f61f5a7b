#![forbid(unsafe_code)]

use dsx_contracts::transfer::{created_id, TransferRequest};
use dsx_engines::rejection_hint::SubmissionStage;
use tracing::{info, warn};

use crate::error::FlowError;
use crate::session::ExchangeSession;
use crate::transport::ConnectorTransport;

const TRANSFER_PROCESSES_PATH: &str = "/management/v3/transferprocesses";

pub struct TransferOrchestrator<'a> {
    transport: &'a dyn ConnectorTransport,
}

impl<'a> TransferOrchestrator<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport) -> Self {
        Self { transport }
    }

    /// Starts a pull transfer for the session's current agreement.
    pub fn start(&self, session: &mut ExchangeSession) -> Result<String, FlowError> {
        let agreement = session
            .agreement()
            .ok_or(FlowError::MissingPrecondition("negotiate an agreement first"))?;
        let transfer_id = self.start_transfer(
            &agreement.agreement_id,
            &agreement.dataset_id,
            &agreement.counterparty_address,
        )?;
        session.begin_transfer(&transfer_id);
        Ok(transfer_id)
    }

    pub fn start_transfer(
        &self,
        agreement_id: &str,
        asset_id: &str,
        counterparty_address: &str,
    ) -> Result<String, FlowError> {
        let request = TransferRequest::v1(
            counterparty_address.to_string(),
            agreement_id.to_string(),
            asset_id.to_string(),
        )?;
        info!(agreement = %agreement_id, asset = %asset_id, "starting transfer");
        let reply = self
            .transport
            .post_management(TRANSFER_PROCESSES_PATH, &request.to_json())?;
        if !reply.is_created() {
            warn!(status = reply.status, "transfer request rejected");
            return Err(FlowError::rejected(SubmissionStage::StartTransfer, &reply));
        }
        let transfer_id = reply
            .json()
            .as_ref()
            .and_then(created_id)
            .ok_or_else(|| FlowError::MalformedResponse {
                stage: "start transfer",
                detail: "response carries no transfer id".to_string(),
            })?;
        info!(transfer = %transfer_id, "transfer started");
        Ok(transfer_id)
    }
}
