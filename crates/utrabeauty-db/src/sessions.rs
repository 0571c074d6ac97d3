//! Database operations for `sessions`.

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;

use crate::DbError;

const TOKEN_LEN: usize = 48;

/// A row from the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Creates a session for `user_id` that expires after `ttl`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (unknown user, or the
/// vanishingly unlikely token collision).
pub async fn create_session(
    pool: &PgPool,
    user_id: i64,
    ttl: Duration,
) -> Result<SessionRow, DbError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "INSERT INTO sessions (user_id, token, expires_at) \
         VALUES ($1, $2, $3) \
         RETURNING id, user_id, token, expires_at, created_at",
    )
    .bind(user_id)
    .bind(generate_token())
    .bind(Utc::now() + ttl)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the session for `token` if it exists and has not expired.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_active_session(pool: &PgPool, token: &str) -> Result<Option<SessionRow>, DbError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT id, user_id, token, expires_at, created_at \
         FROM sessions WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes the session for `token`. Returns `true` if one existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes every expired session and returns how many were deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_expired_sessions(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
