//! Local SQLite datastore
//!
//! Alternative to the REST datastore for single-machine deployments. Uses
//! the same `attempts` and `users` row shapes.

pub mod attempts;
pub mod users;

use sqlx::SqlitePool;
use std::path::Path;
use vox_common::Result;

/// Initialize database connection pool, creating the file if needed
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the attempts and users tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT,
            user_email TEXT,
            user_name TEXT,
            duration INTEGER NOT NULL,
            attempt_number INTEGER NOT NULL,
            transcript TEXT NOT NULL,
            scores TEXT NOT NULL,
            coaching_data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            native_language TEXT,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attempts_user ON attempts(user_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (attempts, users)");

    Ok(())
}
