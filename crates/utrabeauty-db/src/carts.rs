//! Database operations for `carts` and `cart_line_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `carts` table. Each user has at most one cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartRow {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `cart_line_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLineItemRow {
    pub id: i64,
    pub cart_id: i64,
    /// CMS product document id.
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLineItem<'a> {
    pub product_id: &'a str,
    pub product_name: &'a str,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_url: Option<&'a str>,
}

const LINE_ITEM_COLUMNS: &str = "id, cart_id, product_id, product_name, quantity, unit_price, \
                                 supplier_url, created_at, updated_at";

// ---------------------------------------------------------------------------
// carts operations
// ---------------------------------------------------------------------------

/// Returns the user's cart, creating it on first use.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (e.g. unknown user).
pub async fn get_or_create_cart(pool: &PgPool, user_id: i64) -> Result<CartRow, DbError> {
    // The no-op update makes RETURNING yield the existing row on conflict.
    let row = sqlx::query_as::<_, CartRow>(
        "INSERT INTO carts (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id, user_id, created_at, updated_at",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Adds `item` to the cart. When the cart already holds that product the
/// quantity is added to the existing line and its price and name refreshed.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] for a non-positive quantity or negative
/// price, or [`DbError::Sqlx`] if a query fails.
pub async fn add_line_item(
    pool: &PgPool,
    cart_id: i64,
    item: &NewLineItem<'_>,
) -> Result<CartLineItemRow, DbError> {
    if item.quantity <= 0 {
        return Err(DbError::InvalidInput(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.unit_price.is_sign_negative() {
        return Err(DbError::InvalidInput(format!(
            "unit price must not be negative, got {}",
            item.unit_price
        )));
    }

    let mut tx = pool.begin().await?;

    // Lock the cart row so concurrent adds of the same product serialize.
    sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    let existing_id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM cart_line_items \
         WHERE cart_id = $1 AND product_id = $2 \
         ORDER BY id LIMIT 1",
    )
    .bind(cart_id)
    .bind(item.product_id)
    .fetch_optional(&mut *tx)
    .await?;

    let row = if let Some(id) = existing_id {
        sqlx::query_as::<_, CartLineItemRow>(&format!(
            "UPDATE cart_line_items \
             SET quantity = quantity + $1, unit_price = $2, product_name = $3, \
                 supplier_url = COALESCE($4, supplier_url), updated_at = NOW() \
             WHERE id = $5 \
             RETURNING {LINE_ITEM_COLUMNS}"
        ))
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.product_name)
        .bind(item.supplier_url)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?
    } else {
        sqlx::query_as::<_, CartLineItemRow>(&format!(
            "INSERT INTO cart_line_items \
                 (cart_id, product_id, product_name, quantity, unit_price, supplier_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {LINE_ITEM_COLUMNS}"
        ))
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.supplier_url)
        .fetch_one(&mut *tx)
        .await?
    };

    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// Lists the cart's lines in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_line_items(pool: &PgPool, cart_id: i64) -> Result<Vec<CartLineItemRow>, DbError> {
    let rows = sqlx::query_as::<_, CartLineItemRow>(&format!(
        "SELECT {LINE_ITEM_COLUMNS} FROM cart_line_items WHERE cart_id = $1 ORDER BY id"
    ))
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Removes one line from the cart. Returns `true` if it existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_line_item(
    pool: &PgPool,
    cart_id: i64,
    line_item_id: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM cart_line_items WHERE id = $1 AND cart_id = $2")
        .bind(line_item_id)
        .bind(cart_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Merges duplicate `(cart_id, product_id)` lines into the oldest line,
/// summing quantities, and returns the number of rows removed.
///
/// With `dry_run` the merge runs inside a transaction that is rolled back,
/// so the count reflects what would be removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is changed.
pub async fn dedupe_cart_line_items(pool: &PgPool, dry_run: bool) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "WITH totals AS ( \
             SELECT MIN(id) AS keep_id, SUM(quantity)::INTEGER AS total_quantity \
             FROM cart_line_items \
             GROUP BY cart_id, product_id \
             HAVING COUNT(*) > 1 \
         ) \
         UPDATE cart_line_items li \
         SET quantity = totals.total_quantity, updated_at = NOW() \
         FROM totals \
         WHERE li.id = totals.keep_id",
    )
    .execute(&mut *tx)
    .await?;

    let removed = sqlx::query(
        "DELETE FROM cart_line_items li \
         USING cart_line_items keeper \
         WHERE li.cart_id = keeper.cart_id \
           AND li.product_id = keeper.product_id \
           AND li.id > keeper.id",
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if dry_run {
        tx.rollback().await?;
    } else {
        tx.commit().await?;
    }

    Ok(removed)
}
