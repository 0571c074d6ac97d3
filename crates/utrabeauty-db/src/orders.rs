//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utrabeauty_core::OrderStatus;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: Uuid,
    #[serde(skip)]
    pub user_id: Option<i64>,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: String,
    /// Stored as lowercase text; decoding fails on a value outside the enum.
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub total: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub order_id: i64,
    pub position: i32,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Public id of the signed-in customer, if any.
    pub user_public_id: Option<Uuid>,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: String,
    pub currency: String,
    pub items: Vec<NewOrderItem>,
}

/// Largest amount a `NUMERIC(12,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

impl NewOrder {
    /// Sum of `quantity * unit_price` over all items.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidInput`] if the sum overflows or does not fit
    /// the `total` column.
    pub fn total(&self) -> Result<Decimal, DbError> {
        let too_large = || DbError::InvalidInput("order total is too large".to_owned());
        let total = self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            Decimal::from(item.quantity)
                .checked_mul(item.unit_price)
                .and_then(|line| acc.checked_add(line))
                .ok_or_else(too_large)
        })?;
        if total > MAX_AMOUNT {
            return Err(too_large());
        }
        Ok(total)
    }

    /// Checks the invariants the schema also enforces, so callers get a
    /// readable message instead of a constraint name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidInput`] describing the first problem found.
    pub fn validate(&self) -> Result<(), DbError> {
        let invalid = |msg: String| Err(DbError::InvalidInput(msg));

        if self.customer_email.trim().is_empty() || !self.customer_email.contains('@') {
            return invalid("customer_email must be a valid email address".to_owned());
        }
        if self.customer_name.trim().is_empty() {
            return invalid("customer_name is required".to_owned());
        }
        if self.shipping_address.trim().is_empty() {
            return invalid("shipping_address is required".to_owned());
        }
        if self.items.is_empty() {
            return invalid("order must contain at least one item".to_owned());
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.product_id.trim().is_empty() {
                return invalid(format!("items[{index}].product_id is required"));
            }
            if item.quantity <= 0 {
                return invalid(format!("items[{index}].quantity must be positive"));
            }
            if item.unit_price.is_sign_negative() {
                return invalid(format!("items[{index}].unit_price must not be negative"));
            }
            if item.unit_price > MAX_AMOUNT {
                return invalid(format!("items[{index}].unit_price is too large"));
            }
            if item.unit_price.normalize().scale() > 2 {
                return invalid(format!(
                    "items[{index}].unit_price must have at most 2 decimal places"
                ));
            }
        }
        Ok(())
    }
}

const ORDER_COLUMNS: &str = "id, public_id, user_id, customer_email, customer_name, \
                             shipping_address, status, total, currency, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, order_id, position, product_id, product_name, quantity, unit_price, supplier_url";

// ---------------------------------------------------------------------------
// orders operations
// ---------------------------------------------------------------------------

/// Inserts an order and its items in one transaction. The total is computed
/// here from the items, never taken from the caller.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] if validation fails or `user_public_id`
/// names no user, and [`DbError::Sqlx`] if any statement fails (the
/// transaction is rolled back).
pub async fn create_order(pool: &PgPool, order: &NewOrder) -> Result<OrderWithItems, DbError> {
    order.validate()?;
    let total = order.total()?;

    let mut tx = pool.begin().await?;

    let user_id = match order.user_public_id {
        Some(public_id) => Some(
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE public_id = $1")
                .bind(public_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::InvalidInput(format!("unknown user {public_id}")))?,
        ),
        None => None,
    };

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (public_id, user_id, customer_email, customer_name, shipping_address, total, currency) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(order.customer_email.trim())
    .bind(order.customer_name.trim())
    .bind(order.shipping_address.trim())
    .bind(total)
    .bind(&order.currency)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(order.items.len());
    for (position, item) in (1_i32..).zip(&order.items) {
        let item_row = sqlx::query_as::<_, OrderItemRow>(&format!(
            "INSERT INTO order_items \
                 (order_id, position, product_id, product_name, quantity, unit_price, supplier_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(row.id)
        .bind(position)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.supplier_url.as_deref().filter(|u| !u.trim().is_empty()))
        .fetch_one(&mut *tx)
        .await?;
        items.push(item_row);
    }

    tx.commit().await?;
    Ok(OrderWithItems { order: row, items })
}

/// Lists the most recent orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, limit: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one order with its items.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown `public_id`, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn get_order(pool: &PgPool, public_id: Uuid) -> Result<OrderWithItems, DbError> {
    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let items = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY position"
    ))
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    Ok(OrderWithItems { order, items })
}

/// Distinct non-null supplier URLs of an order's items, in item order.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown `public_id`, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn order_supplier_urls(pool: &PgPool, public_id: Uuid) -> Result<Vec<String>, DbError> {
    let order_id: i64 = sqlx::query_scalar("SELECT id FROM orders WHERE public_id = $1")
        .bind(public_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    let urls: Vec<String> = sqlx::query_scalar(
        "SELECT supplier_url FROM ( \
             SELECT supplier_url, MIN(position) AS first_position \
             FROM order_items \
             WHERE order_id = $1 AND supplier_url IS NOT NULL \
             GROUP BY supplier_url \
         ) urls \
         ORDER BY first_position",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, cents: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: "product-rose-glow-serum-1a2b3c4d".to_owned(),
            product_name: "Rose Glow Serum".to_owned(),
            quantity,
            unit_price: Decimal::new(cents, 2),
            supplier_url: None,
        }
    }

    fn order(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            user_public_id: None,
            customer_email: "ana@example.com".to_owned(),
            customer_name: "Ana Souza".to_owned(),
            shipping_address: "Rua das Flores 12, São Paulo".to_owned(),
            currency: "USD".to_owned(),
            items,
        }
    }

    #[test]
    fn total_sums_quantity_times_price() {
        let o = order(vec![item(2, 1250), item(1, 999)]);
        assert_eq!(o.total().unwrap(), Decimal::new(3499, 2));
    }

    #[test]
    fn max_amount_matches_numeric_12_2() {
        assert_eq!(MAX_AMOUNT, Decimal::new(999_999_999_999, 2));
    }

    #[test]
    fn validate_rejects_price_beyond_column_range() {
        let mut o = order(vec![item(2, 0)]);
        o.items[0].unit_price = Decimal::MAX;
        let err = o.validate().unwrap_err();
        assert!(err.to_string().contains("items[0].unit_price is too large"));
    }

    #[test]
    fn total_reports_overflow_instead_of_panicking() {
        let mut o = order(vec![item(2, 0)]);
        o.items[0].unit_price = Decimal::MAX;
        assert!(matches!(o.total(), Err(DbError::InvalidInput(_))));
    }

    #[test]
    fn total_rejects_sum_beyond_column_range() {
        let o = order(vec![item(2, 999_999_999_999)]);
        assert!(o.validate().is_ok());
        assert!(matches!(o.total(), Err(DbError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_sub_cent_prices() {
        let o = order(vec![NewOrderItem {
            unit_price: Decimal::new(5, 3),
            ..item(3, 0)
        }]);
        let err = o.validate().unwrap_err();
        assert!(err.to_string().contains("at most 2 decimal places"));
    }

    #[test]
    fn validate_accepts_trailing_zero_scale() {
        let o = order(vec![NewOrderItem {
            unit_price: Decimal::new(18_500, 3),
            ..item(1, 0)
        }]);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn validate_accepts_well_formed_order() {
        assert!(order(vec![item(1, 100)]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_items() {
        let err = order(vec![]).validate().unwrap_err();
        assert!(err.to_string().contains("at least one item"));
    }

    #[test]
    fn validate_rejects_non_positive_quantity() {
        let err = order(vec![item(1, 100), item(0, 100)]).validate().unwrap_err();
        assert!(err.to_string().contains("items[1].quantity"));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let err = order(vec![item(1, -1)]).validate().unwrap_err();
        assert!(err.to_string().contains("unit_price"));
    }

    #[test]
    fn validate_rejects_missing_address() {
        let mut o = order(vec![item(1, 100)]);
        o.shipping_address = "  ".to_owned();
        assert!(o.validate().is_err());
    }
}
