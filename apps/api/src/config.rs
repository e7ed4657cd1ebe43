use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing. `CLIPDROP_API_KEY` is
/// deliberately optional: its absence surfaces as a per-request
/// configuration error on image generation, not a boot failure.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub identity_url: String,
    pub identity_api_key: String,
    pub gemini_api_key: String,
    pub clipdrop_api_key: Option<String>,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            identity_url: require_env("IDENTITY_URL")?,
            identity_api_key: require_env("IDENTITY_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            clipdrop_api_key: std::env::var("CLIPDROP_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            cloudinary_cloud_name: require_env("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: require_env("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: require_env("CLOUDINARY_API_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
