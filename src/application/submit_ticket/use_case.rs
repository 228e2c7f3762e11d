use crate::{
    application::submit_ticket::dto::SubmitTicketRequest,
    domain::submission::{entity::RelayMessage, errors::DomainError},
    infrastructure::relay::DocumentRelay,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Forwards a validated submission to the chat and disposes of its proof file.
pub struct SubmitTicketUseCase {
    relay: Arc<dyn DocumentRelay>,
}

impl SubmitTicketUseCase {
    pub fn new(relay: Arc<dyn DocumentRelay>) -> Self {
        Self { relay }
    }

    /// Makes exactly one relay attempt.
    ///
    /// The proof file is deleted before this returns, whatever the outcome.
    ///
    /// # Errors
    /// Returns [`DomainError::DeliveryFailed`] for any relay failure. The cause is logged here
    /// and not passed on.
    #[instrument(skip(self, request), fields(
        proof_size = request.proof.record().size_bytes,
        media_type = request.proof.record().media_type.as_mime(),
    ))]
    pub async fn execute(&self, request: SubmitTicketRequest) -> Result<(), DomainError> {
        let SubmitTicketRequest { submission, proof } = request;
        let message = RelayMessage::for_submission(&submission, proof.record().clone());

        let outcome = self.relay.send_document(&message).await;
        drop(proof);

        match outcome {
            Ok(()) => {
                info!("Submission relayed");
                Ok(())
            }
            Err(err) => {
                error!(relay_error = %err, "Submission relay failed");
                Err(DomainError::DeliveryFailed)
            }
        }
    }
}
