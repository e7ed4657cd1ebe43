//! Image capabilities: generation, background removal, object removal.
//!
//! Generation renders through the text-to-image provider and stores the
//! result in the media store; the removal capabilities upload the caller's
//! image and let the media store's transformation effects do the work.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use base64::Engine;
use serde::Deserialize;

use crate::capabilities::collect_upload;
use crate::capabilities::pipeline::{run_capability, CapabilityRequest};
use crate::errors::{AppError, Envelope};
use crate::identity::AuthContext;
use crate::models::creation::CreationKind;
use crate::state::AppState;

const BACKGROUND_REMOVAL_EFFECT: &str = "e_background_removal";

fn object_removal_effect(object: &str) -> String {
    format!("e_gen_remove:{object}")
}

fn png_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub publish: bool,
}

/// POST /api/ai/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<Envelope>, AppError> {
    // The text-to-image client only exists when its key is configured;
    // without one this is a configuration error, not a provider error.
    let Some(image) = state.image.clone() else {
        return Err(AppError::Configuration(
            "Image generation is not configured: CLIPDROP_API_KEY is not set".to_string(),
        ));
    };

    let GenerateImageRequest { prompt, publish } = request;
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let media = state.media.clone();
    let record_prompt = prompt.clone();
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::Image,
            record_prompt,
            publish,
        },
        || async move {
            let bytes = image.text_to_image(&prompt).await?;
            let uploaded = media.upload_data_uri(&png_data_uri(&bytes), None).await?;
            Ok(uploaded.secure_url)
        },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}

/// POST /api/ai/remove-image-background
pub async fn remove_image_background(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<Envelope>, AppError> {
    let form = collect_upload(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("An image upload is required".to_string()))?;

    let media = state.media.clone();
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::Image,
            record_prompt: "Remove background from image".to_string(),
            publish: false,
        },
        || async move {
            let uploaded = media
                .upload_bytes(file.to_vec(), Some(BACKGROUND_REMOVAL_EFFECT))
                .await?;
            Ok(uploaded.secure_url)
        },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}

/// POST /api/ai/remove-image-object
pub async fn remove_image_object(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<Envelope>, AppError> {
    let form = collect_upload(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("An image upload is required".to_string()))?;
    let object = form
        .fields
        .get("object")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation("The object field is required".to_string()))?;

    let media = state.media.clone();
    let effect = object_removal_effect(&object);
    let content = run_capability(
        &auth,
        state.identity.as_ref(),
        state.store.as_ref(),
        CapabilityRequest {
            kind: CreationKind::Image,
            record_prompt: format!("Remove {object} from image"),
            publish: false,
        },
        || async move {
            // The removal effect is applied by URL construction, so the
            // stored content is the transformed URL, not the upload's.
            let uploaded = media.upload_bytes(file.to_vec(), None).await?;
            Ok(media.transform_url(&uploaded.public_id, &effect))
        },
    )
    .await?;

    Ok(Json(Envelope::ok(content)))
}
