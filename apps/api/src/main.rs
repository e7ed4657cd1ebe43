mod capabilities;
mod config;
mod creations;
mod db;
mod errors;
mod identity;
mod models;
mod providers;
mod quota;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::creations::{CreationStore, PgCreationStore};
use crate::db::create_pool;
use crate::identity::{IdentityClient, IdentityProvider};
use crate::providers::chat::{ChatClient, ChatCompletion};
use crate::providers::clipdrop::{ClipdropClient, TextToImage};
use crate::providers::cloudinary::{CloudinaryClient, MediaStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Atelier API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;

    // External collaborators, one typed client each
    let identity: Arc<dyn IdentityProvider> = Arc::new(IdentityClient::new(
        config.identity_url.clone(),
        config.identity_api_key.clone(),
    ));
    let chat: Arc<dyn ChatCompletion> = Arc::new(ChatClient::new(config.gemini_api_key.clone()));
    info!(
        "Chat client initialized (model: {})",
        providers::chat::MODEL
    );

    let image: Option<Arc<dyn TextToImage>> = match &config.clipdrop_api_key {
        Some(key) => Some(Arc::new(ClipdropClient::new(key.clone()))),
        None => {
            warn!("CLIPDROP_API_KEY is not set; image generation will report a configuration error");
            None
        }
    };

    let media: Arc<dyn MediaStore> = Arc::new(CloudinaryClient::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    ));
    let store: Arc<dyn CreationStore> = Arc::new(PgCreationStore::new(pool));

    // Build app state
    let state = AppState {
        identity,
        chat,
        image,
        media,
        store,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
