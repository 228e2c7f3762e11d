use crate::{
    application::submit_ticket::dto::SubmitTicketRequest,
    domain::submission::{entity::Submission, errors::ALL_FIELDS_REQUIRED},
    infrastructure::{
        security::upload_policy::UploadError, storage::scratch_storage::TempUpload,
    },
    presentation::http::{errors::AppError, state::AppState},
};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

/// Raw form values collected while the multipart stream is read.
///
/// Holding the stored proof here means an early return anywhere in parsing deletes it.
#[derive(Default)]
struct SubmissionForm {
    name: Option<String>,
    email: Option<String>,
    tickets_count: Option<String>,
    proof: Option<TempUpload>,
}

impl SubmissionForm {
    fn into_request(self) -> Result<SubmitTicketRequest, AppError> {
        let SubmissionForm {
            name,
            email,
            tickets_count,
            proof,
        } = self;
        let submission = Submission::new(name, email, tickets_count)?;
        let proof = proof.ok_or_else(all_fields_required)?;
        Ok(SubmitTicketRequest { submission, proof })
    }
}

fn all_fields_required() -> AppError {
    AppError::ValidationError(ALL_FIELDS_REQUIRED.into())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let limit = crate::infrastructure::security::MAX_PROOF_SIZE_BYTES;
        return UploadError::TooLarge { limit }.into();
    }
    tracing::warn!(error = %err.body_text(), "Malformed multipart body");
    all_fields_required()
}

/// Validate the declared type, then stream the part into scratch storage chunk by chunk.
async fn store_proof(state: &AppState, field: &mut Field<'_>) -> Result<TempUpload, AppError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let media_type = state.upload_policy.check_media_type(field.content_type())?;

    let mut pending = state.scratch.begin(&original_name, media_type).await?;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        pending.write_chunk(&chunk, &state.upload_policy).await?;
    }
    Ok(pending.finish().await?)
}

async fn read_form(state: &AppState, multipart: &mut Multipart) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = Some(field.text().await.map_err(multipart_error)?),
            "email" => form.email = Some(field.text().await.map_err(multipart_error)?),
            "ticketsCount" => {
                form.tickets_count = Some(field.text().await.map_err(multipart_error)?)
            }
            "proof" => {
                // A file input left empty by the browser arrives with a blank filename.
                if field.file_name().is_none_or(|name| name.trim().is_empty()) {
                    continue;
                }
                if form.proof.is_some() {
                    tracing::warn!("More than one proof file in submission");
                    return Err(AppError::ValidationError(
                        "Можно прикрепить только один файл".into(),
                    ));
                }
                let upload = store_proof(state, &mut field).await?;
                if upload.record().size_bytes == 0 {
                    tracing::debug!("Empty proof file discarded");
                    continue;
                }
                form.proof = Some(upload);
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

pub async fn submit_ticket(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!(rejection = %rejection, "Submission body is not multipart");
        all_fields_required()
    })?;

    let request = read_form(&state, &mut multipart).await?.into_request()?;
    state.submit_ticket.execute(request).await?;

    Ok(Json(json!({ "success": true })))
}
