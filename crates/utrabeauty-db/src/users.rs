//! Database operations for `users`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `users` table.
///
/// `password_hash` is an argon2 PHC string; `NULL` for customers created by
/// checkout who never set a password.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub public_id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    /// `"customer"` or `"admin"`.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: Option<&'a str>,
    pub role: &'a str,
}

const USER_COLUMNS: &str =
    "id, public_id, email, name, password_hash, role, created_at, updated_at";

/// Inserts a user with a fresh `public_id`.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] for an empty email or name, and
/// [`DbError::Sqlx`] on failure; a duplicate email (case-insensitive)
/// surfaces as a unique violation.
pub async fn create_user(pool: &PgPool, user: &NewUser<'_>) -> Result<UserRow, DbError> {
    let email = user.email.trim();
    let name = user.name.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DbError::InvalidInput(format!("invalid email '{email}'")));
    }
    if name.is_empty() {
        return Err(DbError::InvalidInput("name must not be empty".to_owned()));
    }

    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (public_id, email, name, password_hash, role) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Looks up a user by email, ignoring case.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Looks up a user by internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no user has this id, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}
