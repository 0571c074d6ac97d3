//! Live integration tests for utrabeauty-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/utrabeauty-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::Duration;
use rust_decimal::Decimal;
use utrabeauty_db::{
    add_line_item, create_order, create_session, create_user, dedupe_cart_line_items,
    delete_expired_sessions, delete_session, get_active_session, get_or_create_cart, get_order,
    get_user, get_user_by_email, latest_spin_for_user, list_line_items, list_orders,
    order_supplier_urls, record_spin, remove_line_item, smoke_test, DbError, NewLineItem,
    NewOrder, NewOrderItem, NewUser, UserRow,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_user(pool: &sqlx::PgPool, email: &str) -> UserRow {
    create_user(
        pool,
        &NewUser {
            email,
            name: "Test Customer",
            password_hash: None,
            role: "customer",
        },
    )
    .await
    .unwrap_or_else(|e| panic!("insert_test_user failed for '{email}': {e}"))
}

fn line(product_id: &str, quantity: i32) -> NewLineItem<'_> {
    NewLineItem {
        product_id,
        product_name: "Rose Glow Serum",
        quantity,
        unit_price: Decimal::new(2499, 2),
        supplier_url: Some("https://www.amazon.com/dp/B0TEST123"),
    }
}

fn order_item(product_id: &str, quantity: i32, cents: i64, supplier: Option<&str>) -> NewOrderItem {
    NewOrderItem {
        product_id: product_id.to_string(),
        product_name: format!("Product {product_id}"),
        quantity,
        unit_price: Decimal::new(cents, 2),
        supplier_url: supplier.map(str::to_string),
    }
}

fn new_order(items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        user_public_id: None,
        customer_email: "ana@example.com".to_string(),
        customer_name: "Ana Souza".to_string(),
        shipping_address: "Rua das Flores 12, São Paulo".to_string(),
        currency: "USD".to_string(),
        items,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Users & sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_user_then_lookup_by_email_ignores_case(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "Ana@Example.com").await;
    assert_eq!(user.role, "customer");
    assert!(user.password_hash.is_none());

    let found = get_user_by_email(&pool, "ana@example.COM")
        .await
        .expect("get_user_by_email failed")
        .expect("user should exist");
    assert_eq!(found.id, user.id);

    let by_id = get_user(&pool, user.id).await.expect("get_user failed");
    assert_eq!(by_id.public_id, user.public_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_email_is_a_unique_violation(pool: sqlx::PgPool) {
    insert_test_user(&pool, "dup@example.com").await;

    let err = create_user(
        &pool,
        &NewUser {
            email: "DUP@example.com",
            name: "Someone Else",
            password_hash: None,
            role: "customer",
        },
    )
    .await
    .expect_err("duplicate email should fail");

    assert!(err.is_unique_violation(), "unexpected error: {err}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_role_is_rejected_by_the_store(pool: sqlx::PgPool) {
    let result = create_user(
        &pool,
        &NewUser {
            email: "root@example.com",
            name: "Root",
            password_hash: None,
            role: "superuser",
        },
    )
    .await;
    assert!(matches!(result, Err(DbError::Sqlx(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_user_returns_not_found_for_unknown_id(pool: sqlx::PgPool) {
    let err = get_user(&pool, 999_999).await.expect_err("should be missing");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn session_lifecycle(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "session@example.com").await;

    let session = create_session(&pool, user.id, Duration::hours(1))
        .await
        .expect("create_session failed");
    let active = get_active_session(&pool, &session.token)
        .await
        .expect("get_active_session failed");
    assert_eq!(active.map(|s| s.user_id), Some(user.id));

    assert!(delete_session(&pool, &session.token).await.expect("delete"));
    assert!(!delete_session(&pool, &session.token).await.expect("delete again"));
    assert!(get_active_session(&pool, &session.token)
        .await
        .expect("lookup")
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn expired_sessions_are_inactive_and_purged(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "expired@example.com").await;

    let expired = create_session(&pool, user.id, Duration::seconds(-5))
        .await
        .expect("create expired");
    let live = create_session(&pool, user.id, Duration::hours(1))
        .await
        .expect("create live");

    assert!(get_active_session(&pool, &expired.token)
        .await
        .expect("lookup")
        .is_none());

    let removed = delete_expired_sessions(&pool).await.expect("purge");
    assert_eq!(removed, 1);
    assert!(get_active_session(&pool, &live.token)
        .await
        .expect("lookup")
        .is_some());
}

// ---------------------------------------------------------------------------
// Section 2: Carts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn get_or_create_cart_is_idempotent(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "cart@example.com").await;
    let first = get_or_create_cart(&pool, user.id).await.expect("create");
    let second = get_or_create_cart(&pool, user.id).await.expect("get");
    assert_eq!(first.id, second.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn adding_same_product_merges_quantity(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "merge@example.com").await;
    let cart = get_or_create_cart(&pool, user.id).await.expect("cart");

    add_line_item(&pool, cart.id, &line("product-a", 1))
        .await
        .expect("first add");
    let merged = add_line_item(&pool, cart.id, &line("product-a", 2))
        .await
        .expect("second add");
    add_line_item(&pool, cart.id, &line("product-b", 1))
        .await
        .expect("other product");

    assert_eq!(merged.quantity, 3);
    let lines = list_line_items(&pool, cart.id).await.expect("list");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_id, "product-a");
    assert_eq!(lines[1].product_id, "product-b");
}

#[sqlx::test(migrations = "../../migrations")]
async fn add_line_item_rejects_bad_input_and_unknown_cart(pool: sqlx::PgPool) {
    let err = add_line_item(&pool, 1, &line("product-a", 0))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, DbError::InvalidInput(_)));

    let err = add_line_item(&pool, 999_999, &line("product-a", 1))
        .await
        .expect_err("unknown cart");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn remove_line_item_only_touches_its_cart(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "owner@example.com").await;
    let other = insert_test_user(&pool, "other@example.com").await;
    let cart = get_or_create_cart(&pool, owner.id).await.expect("cart");
    let other_cart = get_or_create_cart(&pool, other.id).await.expect("cart");

    let item = add_line_item(&pool, cart.id, &line("product-a", 1))
        .await
        .expect("add");

    assert!(!remove_line_item(&pool, other_cart.id, item.id)
        .await
        .expect("remove from wrong cart"));
    assert!(remove_line_item(&pool, cart.id, item.id)
        .await
        .expect("remove"));
    assert!(list_line_items(&pool, cart.id).await.expect("list").is_empty());
}

async fn insert_raw_line(pool: &sqlx::PgPool, cart_id: i64, product_id: &str, quantity: i32) {
    sqlx::query(
        "INSERT INTO cart_line_items (cart_id, product_id, product_name, quantity, unit_price) \
         VALUES ($1, $2, 'Raw Line', $3, 10.00)",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await
    .expect("insert raw line");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dedupe_merges_duplicate_lines(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "dedupe@example.com").await;
    let cart = get_or_create_cart(&pool, user.id).await.expect("cart");

    insert_raw_line(&pool, cart.id, "product-a", 1).await;
    insert_raw_line(&pool, cart.id, "product-a", 2).await;
    insert_raw_line(&pool, cart.id, "product-a", 4).await;
    insert_raw_line(&pool, cart.id, "product-b", 1).await;

    let would_remove = dedupe_cart_line_items(&pool, true).await.expect("dry run");
    assert_eq!(would_remove, 2);
    assert_eq!(list_line_items(&pool, cart.id).await.expect("list").len(), 4);

    let removed = dedupe_cart_line_items(&pool, false).await.expect("dedupe");
    assert_eq!(removed, 2);

    let lines = list_line_items(&pool, cart.id).await.expect("list");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_id, "product-a");
    assert_eq!(lines[0].quantity, 7);
    assert_eq!(lines[1].quantity, 1);

    assert_eq!(dedupe_cart_line_items(&pool, false).await.expect("again"), 0);
}

// ---------------------------------------------------------------------------
// Section 3: Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_order_computes_total_and_keeps_item_order(pool: sqlx::PgPool) {
    let created = create_order(
        &pool,
        &new_order(vec![
            order_item("product-a", 2, 1250, Some("https://a.example.com/1")),
            order_item("product-b", 1, 999, None),
        ]),
    )
    .await
    .expect("create_order failed");

    assert_eq!(created.order.total, Decimal::new(3499, 2));
    assert_eq!(created.order.status, utrabeauty_core::OrderStatus::Pending);
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.items[0].position, 1);
    assert_eq!(created.items[1].position, 2);

    let fetched = get_order(&pool, created.order.public_id)
        .await
        .expect("get_order failed");
    assert_eq!(fetched.order.id, created.order.id);
    assert_eq!(fetched.items[0].product_id, "product-a");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_order_links_known_user_and_rejects_unknown(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "buyer@example.com").await;

    let mut order = new_order(vec![order_item("product-a", 1, 100, None)]);
    order.user_public_id = Some(user.public_id);
    let created = create_order(&pool, &order).await.expect("create");
    assert_eq!(created.order.user_id, Some(user.id));

    order.user_public_id = Some(Uuid::new_v4());
    let err = create_order(&pool, &order).await.expect_err("unknown user");
    assert!(matches!(err, DbError::InvalidInput(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_orders_is_newest_first_and_limited(pool: sqlx::PgPool) {
    let mut ids = Vec::new();
    for _ in 0..3 {
        let created = create_order(&pool, &new_order(vec![order_item("p", 1, 100, None)]))
            .await
            .expect("create");
        ids.push(created.order.public_id);
    }

    let listed = list_orders(&pool, 2).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].public_id, ids[2]);
    assert_eq!(listed[1].public_id, ids[1]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn supplier_urls_are_distinct_in_item_order(pool: sqlx::PgPool) {
    let created = create_order(
        &pool,
        &new_order(vec![
            order_item("p1", 1, 100, Some("https://b.example.com/listing")),
            order_item("p2", 1, 100, None),
            order_item("p3", 1, 100, Some("https://a.example.com/listing")),
            order_item("p4", 1, 100, Some("https://b.example.com/listing")),
        ]),
    )
    .await
    .expect("create");

    let urls = order_supplier_urls(&pool, created.order.public_id)
        .await
        .expect("supplier urls");
    assert_eq!(
        urls,
        vec![
            "https://b.example.com/listing".to_string(),
            "https://a.example.com/listing".to_string(),
        ]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_order_is_not_found(pool: sqlx::PgPool) {
    let missing = Uuid::new_v4();
    assert!(matches!(
        get_order(&pool, missing).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(
        order_supplier_urls(&pool, missing).await,
        Err(DbError::NotFound)
    ));
}

// ---------------------------------------------------------------------------
// Section 4: Wheel spins & smoke test
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn latest_spin_returns_most_recent(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "spinner@example.com").await;
    assert!(latest_spin_for_user(&pool, user.id)
        .await
        .expect("none yet")
        .is_none());

    record_spin(&pool, user.id, "no prize", None)
        .await
        .expect("first spin");
    let second = record_spin(&pool, user.id, "10% off", Some("GLOW10"))
        .await
        .expect("second spin");

    let latest = latest_spin_for_user(&pool, user.id)
        .await
        .expect("latest")
        .expect("a spin exists");
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.discount_code.as_deref(), Some("GLOW10"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn smoke_test_counts_every_table(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "smoke@example.com").await;
    create_session(&pool, user.id, Duration::hours(1))
        .await
        .expect("session");

    let report = smoke_test(&pool).await.expect("smoke_test failed");
    assert_eq!(report.tables.len(), 7);

    let count = |name: &str| {
        report
            .tables
            .iter()
            .find(|(table, _)| table == name)
            .map(|(_, n)| *n)
    };
    assert_eq!(count("users"), Some(1));
    assert_eq!(count("sessions"), Some(1));
    assert_eq!(count("orders"), Some(0));
    assert_eq!(report.total_rows(), 2);
}
