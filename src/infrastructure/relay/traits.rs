use crate::domain::submission::entity::RelayMessage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not read stored document: {0}")]
    Document(#[source] std::io::Error),

    #[error("relay transport failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("relay endpoint rejected document (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound delivery of a submission document to the chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRelay: Send + Sync {
    /// One delivery attempt. No retries.
    async fn send_document(&self, message: &RelayMessage) -> Result<(), RelayError>;
}
