//! HTTP error handling and response conversion.
//!
//! Every failure a request can hit is mapped here to a status code and a `{"error": ...}`
//! JSON body. The message shown to the caller is fixed per category; details only go to the log.

use crate::{
    domain::submission::errors::{DELIVERY_FAILED, DomainError},
    infrastructure::security::upload_policy::UploadError,
};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Application-level errors returned from handlers and middleware.
#[derive(Debug)]
pub enum AppError {
    /// Missing field, missing file or disallowed file type (400).
    ValidationError(String),

    /// Proof file over the size limit (413).
    PayloadTooLarge(String),

    /// Request origin not in the allow-list (403).
    Forbidden(String),

    /// Method other than POST or OPTIONS (405).
    MethodNotAllowed,

    /// Rate limit exceeded (429).
    RateLimited,

    /// Scratch storage I/O failed (500).
    Storage(String),

    /// Relay to the chat failed (500).
    Relay,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
            Self::Relay => write!(f, "Relay error"),
        }
    }
}

impl AppError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) | Self::Relay => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-safe error message (without implementation details).
    fn user_message(&self) -> String {
        match self {
            Self::ValidationError(msg) => msg.clone(),
            Self::PayloadTooLarge(msg) => msg.clone(),
            Self::Forbidden(msg) => msg.clone(),
            Self::MethodNotAllowed => "Method not allowed".into(),
            Self::RateLimited => "Too many requests, please try again later".into(),
            Self::Storage(_) => "File operation failed".into(),
            Self::Relay => DELIVERY_FAILED.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.user_message();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("error={}", self);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::debug!("error={}", self);
            }
            _ => {
                tracing::warn!("error={}", self);
            }
        }

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
        }
        response
    }
}

// === Domain Error Conversion ===

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => AppError::ValidationError(msg),
            DomainError::DeliveryFailed => AppError::Relay,
        }
    }
}

// === Upload Error Conversion ===

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.user_message().to_string();
        match err {
            UploadError::UnsupportedMediaType { declared } => {
                tracing::warn!(declared_media_type = %declared, "Proof file type rejected");
                AppError::ValidationError(message)
            }
            UploadError::TooLarge { limit } => {
                tracing::warn!(limit_bytes = limit, "Proof file too large");
                AppError::PayloadTooLarge(message)
            }
            UploadError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
