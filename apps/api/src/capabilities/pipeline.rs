//! The shared capability pipeline.
//!
//! Strict order: quota check → provider call → persist → quota increment.
//! A denial short-circuits before the provider closure runs; a provider
//! failure skips both the insert and the increment; an insert failure skips
//! the increment. The already-produced external artifact is never rolled
//! back after an insert failure (at-most-once artifact, best-effort record).
//!
//! The increment writes the snapshot value + 1 back through the identity
//! collaborator rather than re-reading the counter, so concurrent requests
//! from one user can race (see `crate::quota`).

use std::future::Future;

use tracing::info;

use crate::creations::CreationStore;
use crate::errors::AppError;
use crate::identity::{AuthContext, IdentityProvider};
use crate::models::creation::{CreationKind, NewCreation};
use crate::quota::{self, QuotaDecision};

/// Handler-specific inputs to the shared pipeline.
pub struct CapabilityRequest {
    pub kind: CreationKind,
    /// Stored verbatim as the record's prompt: the user's prompt for text
    /// capabilities, a fixed descriptive string for the media ones.
    pub record_prompt: String,
    pub publish: bool,
}

/// Runs one capability invocation end to end and returns the generated
/// content (text or artifact URL) for the success envelope.
pub async fn run_capability<F, Fut>(
    auth: &AuthContext,
    identity: &dyn IdentityProvider,
    store: &dyn CreationStore,
    request: CapabilityRequest,
    invoke_provider: F,
) -> Result<String, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    if let QuotaDecision::Denied = quota::check(auth.plan, auth.free_usage) {
        info!(
            user_id = %auth.user_id,
            free_usage = auth.free_usage,
            "free usage limit reached"
        );
        return Err(AppError::QuotaExceeded);
    }

    let content = invoke_provider().await?;

    store
        .append(NewCreation {
            user_id: auth.user_id.clone(),
            prompt: request.record_prompt,
            content: content.clone(),
            kind: request.kind,
            publish: request.publish,
        })
        .await?;

    // A failed provider call or insert must not consume quota, so the
    // increment comes last.
    if !auth.plan.is_premium() {
        identity
            .put_free_usage(&auth.user_id, auth.free_usage + 1)
            .await?;
    }

    info!(
        user_id = %auth.user_id,
        kind = request.kind.as_str(),
        "creation recorded"
    );
    Ok(content)
}
