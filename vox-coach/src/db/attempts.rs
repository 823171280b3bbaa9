//! Attempt record database operations

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use vox_common::{Error, Result};

use crate::models::AttemptRecord;

/// Insert one attempt record, returning its row id
pub async fn insert_attempt(pool: &SqlitePool, record: &AttemptRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO attempts (
            user_id, user_email, user_name, duration, attempt_number,
            transcript, scores, coaching_data, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.user_id)
    .bind(&record.user_email)
    .bind(&record.user_name)
    .bind(record.duration as i64)
    .bind(record.attempt_number as i64)
    .bind(&record.transcript)
    .bind(&record.scores)
    .bind(&record.coaching_data)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Attempts of one user, oldest first
pub async fn list_attempts_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<AttemptRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT user_id, user_email, user_name, duration, attempt_number,
               transcript, scores, coaching_data, created_at
        FROM attempts
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let created_at: String = row.get("created_at");
            let duration: i64 = row.get("duration");
            let attempt_number: i64 = row.get("attempt_number");

            Ok(AttemptRecord {
                user_id: row.get("user_id"),
                user_email: row.get("user_email"),
                user_name: row.get("user_name"),
                duration: u32::try_from(duration)
                    .map_err(|_| Error::Internal(format!("Invalid duration in database: {}", duration)))?,
                attempt_number: u8::try_from(attempt_number).map_err(|_| {
                    Error::Internal(format!("Invalid attempt number in database: {}", attempt_number))
                })?,
                transcript: row.get("transcript"),
                scores: row.get("scores"),
                coaching_data: row.get("coaching_data"),
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database '{}': {}", value, e)))
}
