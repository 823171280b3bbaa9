//! Registered user database operations

use sqlx::{Row, SqlitePool};
use vox_common::api::UserProfile;
use vox_common::Result;

use super::attempts::parse_timestamp;

/// Insert or update a registration profile
///
/// Re-registering with the same user id replaces the stored profile.
pub async fn upsert_user(pool: &SqlitePool, user: &UserProfile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, name, email, native_language, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            native_language = excluded.native_language,
            role = excluded.role
        "#,
    )
    .bind(&user.user_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.native_language)
    .bind(&user.role)
    .bind(user.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_user(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT user_id, name, email, native_language, role, created_at FROM users WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let created_at: String = row.get("created_at");
        Ok(UserProfile {
            user_id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            native_language: row.get("native_language"),
            role: row.get("role"),
            created_at: parse_timestamp(&created_at)?,
        })
    })
    .transpose()
}
