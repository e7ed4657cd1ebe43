//! Identity collaborator — resolves the caller and persists quota updates.
//!
//! Authentication itself lives in the external identity service; this module
//! only calls it: once per request to resolve `{user_id, plan, free_usage}`
//! from the bearer token, and once after a successful non-premium generation
//! to write the incremented counter back.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ────────────────────────────────────────────────────────────────────────────
// Identity types
// ────────────────────────────────────────────────────────────────────────────

/// Subscription tier. Anything the identity service reports other than
/// `premium` degrades to the free tier, so an unknown plan lands on the
/// quota-limited path rather than on unlimited access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Plan {
    Premium,
    #[default]
    Free,
}

impl From<String> for Plan {
    fn from(plan: String) -> Self {
        if plan == "premium" {
            Plan::Premium
        } else {
            Plan::Free
        }
    }
}

impl Plan {
    pub fn is_premium(self) -> bool {
        matches!(self, Plan::Premium)
    }
}

/// Caller identity resolved by the identity service for one request.
/// `free_usage` is a snapshot taken at resolve time; see `crate::quota`
/// for what that implies under concurrency.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub plan: Plan,
    pub free_usage: i64,
}

/// The identity collaborator boundary. Carried in `AppState` as a trait
/// object so tests can substitute an in-memory fake.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token into the caller's identity and usage state.
    async fn resolve(&self, token: &str) -> Result<AuthContext, AppError>;

    /// Persists a new free-usage counter value for the user.
    async fn put_free_usage(&self, user_id: &str, free_usage: i64) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: String,
    #[serde(default)]
    plan: Plan,
    #[serde(default)]
    free_usage: i64,
}

#[derive(Debug, Serialize)]
struct MetadataPatch {
    free_usage: i64,
}

/// HTTP client for the identity service.
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl IdentityClient {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn resolve(&self, token: &str) -> Result<AuthContext, AppError> {
        let response = self
            .client
            .post(format!("{}/v1/tokens/verify", self.base_url))
            .bearer_auth(&self.service_key)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Identity service unreachable: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Identity verify returned {status}: {body}");
            return Err(AppError::Provider(format!(
                "Identity service error (status {status})"
            )));
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed identity response: {e}")))?;

        Ok(AuthContext {
            user_id: verified.user_id,
            plan: verified.plan,
            free_usage: verified.free_usage,
        })
    }

    async fn put_free_usage(&self, user_id: &str, free_usage: i64) -> Result<(), AppError> {
        let response = self
            .client
            .patch(format!("{}/v1/users/{user_id}/metadata", self.base_url))
            .bearer_auth(&self.service_key)
            .json(&MetadataPatch { free_usage })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Identity service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Free-usage update for {user_id} returned {status}: {body}");
            return Err(AppError::Provider(format!(
                "Failed to persist the usage counter (status {status})"
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth middleware
// ────────────────────────────────────────────────────────────────────────────

fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware guarding every capability route: resolves the caller through
/// the identity service and stashes the `AuthContext` in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let auth = state.identity.resolve(token).await?;
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
