//! Row-count smoke test across every application table.

use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// Tables checked by [`smoke_test`], in dependency order.
const TABLES: [&str; 7] = [
    "users",
    "sessions",
    "carts",
    "cart_line_items",
    "orders",
    "order_items",
    "wheel_of_fortune_spins",
];

/// Row counts per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeReport {
    pub tables: Vec<(String, i64)>,
}

impl SmokeReport {
    #[must_use]
    pub fn total_rows(&self) -> i64 {
        self.tables.iter().map(|(_, n)| n).sum()
    }
}

/// Counts rows in every table. Fails fast if any table is missing, which
/// usually means migrations have not been run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any count query fails.
pub async fn smoke_test(pool: &PgPool) -> Result<SmokeReport, DbError> {
    let mut tables = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        // Table names come from the constant list above, never from input.
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await?;
        tables.push((table.to_owned(), count));
    }
    Ok(SmokeReport { tables })
}
