use thiserror::Error;

/// Shown to the caller whenever a required field or the proof file is missing.
pub const ALL_FIELDS_REQUIRED: &str = "Все поля обязательны!";

/// Shown to the caller whenever the relay could not deliver the submission.
pub const DELIVERY_FAILED: &str = "Не удалось отправить в Telegram";

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Delivery failed")]
    DeliveryFailed,
}
