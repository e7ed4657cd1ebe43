use std::sync::Arc;

use crate::creations::CreationStore;
use crate::identity::IdentityProvider;
use crate::providers::chat::ChatCompletion;
use crate::providers::clipdrop::TextToImage;
use crate::providers::cloudinary::MediaStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. Every external collaborator is a trait object so tests can
/// substitute fakes without touching handler code.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub chat: Arc<dyn ChatCompletion>,
    /// Present only when the Clipdrop key is configured; a missing key
    /// short-circuits image generation before any network call.
    pub image: Option<Arc<dyn TextToImage>>,
    pub media: Arc<dyn MediaStore>,
    pub store: Arc<dyn CreationStore>,
}
