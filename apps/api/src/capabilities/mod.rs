//! Capability endpoints. Each one is the same composition (quota check,
//! one provider call, one creation-store insert, response envelope) run
//! through `pipeline::run_capability` with handler-specific inputs.

pub mod image;
pub mod pipeline;
pub mod resume;
pub mod text;

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// A parsed multipart request: at most one uploaded file plus any plain
/// text fields. The upload is recognized by its filename, not its field
/// name, so clients are free to name the part `image`, `resume`, or `file`.
pub(crate) struct UploadForm {
    pub file: Option<Bytes>,
    pub fields: HashMap<String, String>,
}

pub(crate) async fn collect_upload(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        file: None,
        fields: HashMap::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            form.file = Some(bytes);
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}
