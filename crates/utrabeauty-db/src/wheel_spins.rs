//! Database operations for `wheel_of_fortune_spins`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `wheel_of_fortune_spins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WheelSpinRow {
    pub id: i64,
    pub user_id: i64,
    pub prize: String,
    pub discount_code: Option<String>,
    pub spun_at: DateTime<Utc>,
}

/// Records one spin of the promotional wheel.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (e.g. unknown user).
pub async fn record_spin(
    pool: &PgPool,
    user_id: i64,
    prize: &str,
    discount_code: Option<&str>,
) -> Result<WheelSpinRow, DbError> {
    let row = sqlx::query_as::<_, WheelSpinRow>(
        "INSERT INTO wheel_of_fortune_spins (user_id, prize, discount_code) \
         VALUES ($1, $2, $3) \
         RETURNING id, user_id, prize, discount_code, spun_at",
    )
    .bind(user_id)
    .bind(prize)
    .bind(discount_code)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The user's most recent spin, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_spin_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<WheelSpinRow>, DbError> {
    let row = sqlx::query_as::<_, WheelSpinRow>(
        "SELECT id, user_id, prize, discount_code, spun_at \
         FROM wheel_of_fortune_spins \
         WHERE user_id = $1 \
         ORDER BY spun_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
