//! Creation store — append-only persistence of generated artifacts.
//!
//! This service only ever inserts; listing and sharing live in a separate
//! surface that reads the same table.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::creation::NewCreation;

/// The persistence boundary for creation records. Carried in `AppState` as
/// a trait object so the pipeline tests can substitute an in-memory fake.
#[async_trait]
pub trait CreationStore: Send + Sync {
    /// Appends exactly one record. Called only after the provider call has
    /// succeeded; never called on a failed invocation.
    async fn append(&self, record: NewCreation) -> Result<(), AppError>;
}

pub struct PgCreationStore {
    pool: PgPool,
}

impl PgCreationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationStore for PgCreationStore {
    async fn append(&self, record: NewCreation) -> Result<(), AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO creations (id, user_id, prompt, content, type, publish) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.prompt)
        .bind(&record.content)
        .bind(record.kind.as_str())
        .bind(record.publish)
        .execute(&self.pool)
        .await?;

        debug!(
            "Recorded {} creation {id} for user {}",
            record.kind.as_str(),
            record.user_id
        );
        Ok(())
    }
}
