//! Text capabilities: article generation and blog-title generation.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::capabilities::pipeline::{run_capability, CapabilityRequest};
use crate::errors::{AppError, Envelope};
use crate::identity::AuthContext;
use crate::models::creation::CreationKind;
use crate::state::AppState;

/// Titles are short; the token bound is fixed rather than caller-supplied.
const TITLE_MAX_TOKENS: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    pub prompt: String,
    /// Token bound for the completion, taken verbatim from the request.
    pub length: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateTitleRequest {
    pub prompt: String,
}

/// POST /api/ai/generate-article
pub async fn generate_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<GenerateArticleRequest>,
) -> Result<Json<Envelope>, AppError> {
    let GenerateArticleRequest { prompt, length } = request;
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let chat = state.chat.clone();
    let record_prompt = prompt.clone();
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::Article,
            record_prompt,
            publish: false,
        },
        || async move { chat.complete(&prompt, length).await },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}

/// POST /api/ai/generate-blog-title
pub async fn generate_blog_title(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<GenerateTitleRequest>,
) -> Result<Json<Envelope>, AppError> {
    let GenerateTitleRequest { prompt } = request;
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let chat = state.chat.clone();
    let record_prompt = prompt.clone();
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::Article,
            record_prompt,
            publish: false,
        },
        || async move { chat.complete(&prompt, TITLE_MAX_TOKENS).await },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}
