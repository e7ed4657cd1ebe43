//! Thin typed clients for the external providers. Each capability handler
//! reaches these only through the traits re-exported by the submodules, so
//! tests can swap in fakes without touching handler code.

pub mod chat;
pub mod clipdrop;
pub mod cloudinary;

use thiserror::Error;

use crate::errors::AppError;

/// Failure modes shared by every outbound provider call. Timeouts surface
/// through `Http` (reqwest reports them as request errors) and count as
/// provider failures like any other.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Provider returned empty content")]
    EmptyContent,
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.to_string())
    }
}
