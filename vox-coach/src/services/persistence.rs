//! Datastore adapters
//!
//! Attempt and user records go to either a PostgREST-compatible remote
//! datastore (Supabase) or a local SQLite file. Callers treat every
//! [`PersistenceError`] as non-fatal.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use vox_common::api::UserProfile;

use crate::db;
use crate::models::AttemptRecord;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Datastore error {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Database(#[from] vox_common::Error),
}

/// Record sink used by the orchestrator and the registration endpoint
#[async_trait]
pub trait CoachingStore: Send + Sync {
    /// Short backend label for logs and health output
    fn backend(&self) -> &'static str;

    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError>;

    async fn save_user(&self, user: &UserProfile) -> Result<(), PersistenceError>;
}

/// PostgREST (Supabase) datastore
pub struct RestCoachingStore {
    http_client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestCoachingStore {
    pub fn new(base_url: String, service_key: String, timeout: Duration) -> Result<Self, PersistenceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(vox_common::config::get_user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    async fn insert_row<T: serde::Serialize + Sync>(&self, table: &str, row: &T) -> Result<(), PersistenceError> {
        let response = self
            .http_client
            .post(format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(table, status = status.as_u16(), "Row inserted");
        Ok(())
    }
}

#[async_trait]
impl CoachingStore for RestCoachingStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError> {
        self.insert_row("attempts", record).await
    }

    async fn save_user(&self, user: &UserProfile) -> Result<(), PersistenceError> {
        self.insert_row("users", user).await
    }
}

/// Local SQLite datastore
pub struct SqliteCoachingStore {
    pool: SqlitePool,
}

impl SqliteCoachingStore {
    /// Open (or create) the database at `path`
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        let pool = db::init_database_pool(path).await?;
        tracing::info!("SQLite datastore ready: {}", path.display());
        Ok(Self { pool })
    }

    /// Wrap an existing pool; tables are created if missing
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PersistenceError> {
        db::init_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CoachingStore for SqliteCoachingStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError> {
        let id = db::attempts::insert_attempt(&self.pool, record).await?;
        tracing::debug!(id, "Attempt stored");
        Ok(())
    }

    async fn save_user(&self, user: &UserProfile) -> Result<(), PersistenceError> {
        db::users::upsert_user(&self.pool, user).await?;
        Ok(())
    }
}
