//! Resume review: PDF text extraction followed by a chat-completion
//! critique. Oversized uploads are rejected before the quota check and
//! before any provider is touched.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use tracing::debug;

use crate::capabilities::collect_upload;
use crate::capabilities::pipeline::{run_capability, CapabilityRequest};
use crate::errors::{AppError, Envelope};
use crate::identity::AuthContext;
use crate::models::creation::CreationKind;
use crate::state::AppState;

const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
const REVIEW_MAX_TOKENS: u32 = 1000;
const RECORD_PROMPT: &str = "Review the uploaded resume";

fn validate_resume_size(len: usize) -> Result<(), AppError> {
    if len > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "File size exceeds 5MB limit.".to_string(),
        ));
    }
    Ok(())
}

async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Provider(format!("Failed to read the uploaded PDF: {e}")))
}

/// POST /api/ai/resume-review
pub async fn resume_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<Envelope>, AppError> {
    let form = collect_upload(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("A resume upload is required".to_string()))?;
    validate_resume_size(file.len())?;
    debug!("Reviewing resume upload of {} bytes", file.len());

    let chat = state.chat.clone();
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::ResumeReview,
            record_prompt: RECORD_PROMPT.to_string(),
            publish: false,
        },
        || async move {
            let text = extract_pdf_text(file).await?;
            let prompt = format!(
                "Review the following resume and provide constructive feedback on its \
                 strengths, weaknesses, and areas for improvement. Resume content:\n\n{text}"
            );
            chat.complete(&prompt, REVIEW_MAX_TOKENS).await
        },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_five_mib_is_accepted() {
        assert!(validate_resume_size(MAX_RESUME_BYTES).is_ok());
    }

    #[test]
    fn test_one_byte_over_five_mib_is_rejected() {
        let err = validate_resume_size(MAX_RESUME_BYTES + 1).unwrap_err();
        match err {
            AppError::Validation(message) => {
                assert_eq!(message, "File size exceeds 5MB limit.")
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_small_upload_is_accepted() {
        assert!(validate_resume_size(1).is_ok());
        assert!(validate_resume_size(0).is_ok());
    }
}
