use super::{
    errors::{ALL_FIELDS_REQUIRED, DomainError},
    value_objects::ProofMediaType,
};
use std::path::PathBuf;
use validator::Validate;

/// Telegram rejects document captions longer than this.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// One ticket purchase request, as typed into the form.
#[derive(Debug, Clone, Validate)]
pub struct Submission {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub tickets_count: String,
}

impl Submission {
    /// Build a submission from raw form values. Values are trimmed; a missing or blank value
    /// fails with the all-fields-required message.
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        tickets_count: Option<String>,
    ) -> Result<Self, DomainError> {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string()).unwrap_or_default();
        let submission = Self {
            name: trimmed(name),
            email: trimmed(email),
            tickets_count: trimmed(tickets_count),
        };
        submission.validate().map_err(|errors| {
            tracing::debug!(invalid_fields = ?errors.field_errors().keys().collect::<Vec<_>>());
            DomainError::ValidationError(ALL_FIELDS_REQUIRED.to_string())
        })?;
        Ok(submission)
    }
}

/// A proof file that has been fully written to scratch storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_name: String,
    pub media_type: ProofMediaType,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// What gets posted to the chat: a caption and the document it describes.
#[derive(Debug, Clone)]
pub struct RelayMessage {
    pub caption: String,
    pub document: UploadedFile,
}

impl RelayMessage {
    pub fn for_submission(submission: &Submission, document: UploadedFile) -> Self {
        let caption = format!(
            "🎟 Новая заявка!\nИмя: {}\nEmail: {}\nБилетов: {}",
            submission.name, submission.email, submission.tickets_count
        );
        Self {
            caption: truncate_chars(caption, MAX_CAPTION_CHARS),
            document,
        }
    }
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}
