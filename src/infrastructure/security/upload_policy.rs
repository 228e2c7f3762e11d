use crate::domain::submission::value_objects::ProofMediaType;
use thiserror::Error;

/// Largest proof file accepted, in bytes (5 MiB).
pub const MAX_PROOF_SIZE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported media type: {declared}")]
    UnsupportedMediaType { declared: String },

    #[error("file exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("scratch storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Message safe to return to the uploader.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "Только JPG, PNG или PDF!",
            Self::TooLarge { .. } => "Файл слишком большой (максимум 5 МБ)",
            Self::Io(_) => "File operation failed",
        }
    }
}

/// Admission rules for the proof file, checked while the upload streams in.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    max_size_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_PROOF_SIZE_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Resolve the declared `Content-Type` of a file part against the allow-list.
    pub fn check_media_type(&self, declared: Option<&str>) -> Result<ProofMediaType, UploadError> {
        let declared = declared.unwrap_or_default();
        ProofMediaType::from_mime(declared).ok_or_else(|| UploadError::UnsupportedMediaType {
            declared: declared.to_string(),
        })
    }

    /// Called before each chunk is written with the total the file would reach.
    pub fn check_size(&self, total_bytes: u64) -> Result<(), UploadError> {
        if total_bytes > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_size_bytes,
            });
        }
        Ok(())
    }
}
