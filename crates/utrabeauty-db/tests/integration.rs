//! Offline unit tests for utrabeauty-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use utrabeauty_core::{AppConfig, Environment, OrderStatus};
use utrabeauty_db::{
    NewOrder, NewOrderItem, OrderItemRow, OrderRow, OrderWithItems, PoolConfig,
};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        categories_path: PathBuf::from("./config/categories.yaml"),
        selectors_path: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        cms_api_url: Some("https://cms.example.com/v2023-05-03".to_string()),
        cms_dataset: "production".to_string(),
        cms_token: None,
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_string(),
        scraper_max_retries: 2,
        scraper_retry_backoff_base_secs: 1,
        import_max_images: 8,
        import_max_image_bytes: 10_485_760,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Orders are addressed by `public_id` over the API; internal ids stay private.
#[test]
fn order_with_items_serializes_public_id_only() {
    let public_id = Uuid::new_v4();
    let order = OrderWithItems {
        order: OrderRow {
            id: 17,
            public_id,
            user_id: Some(3),
            customer_email: "ana@example.com".to_string(),
            customer_name: "Ana Souza".to_string(),
            shipping_address: "Rua das Flores 12".to_string(),
            status: OrderStatus::Pending,
            total: Decimal::new(2499, 2),
            currency: "USD".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        items: vec![OrderItemRow {
            id: 5,
            order_id: 17,
            position: 1,
            product_id: "product-rose-glow-serum-1a2b3c4d".to_string(),
            product_name: "Rose Glow Serum".to_string(),
            quantity: 1,
            unit_price: Decimal::new(2499, 2),
            supplier_url: Some("https://www.amazon.com/dp/B0TEST123".to_string()),
        }],
    };

    let json = serde_json::to_value(&order).expect("serialize");
    assert_eq!(json["id"], public_id.to_string());
    assert_eq!(json["total"], "24.99");
    assert_eq!(json["status"], "pending");
    assert!(json.get("user_id").is_none());
    assert_eq!(json["items"][0]["position"], 1);
    assert!(json["items"][0].get("order_id").is_none());
}

#[test]
fn new_order_total_includes_free_items() {
    let order = NewOrder {
        user_public_id: None,
        customer_email: "ana@example.com".to_string(),
        customer_name: "Ana".to_string(),
        shipping_address: "Somewhere 1".to_string(),
        currency: "USD".to_string(),
        items: vec![
            NewOrderItem {
                product_id: "a".to_string(),
                product_name: "A".to_string(),
                quantity: 3,
                unit_price: Decimal::new(500, 2),
                supplier_url: None,
            },
            NewOrderItem {
                product_id: "b".to_string(),
                product_name: "B".to_string(),
                quantity: 1,
                unit_price: Decimal::ZERO,
                supplier_url: None,
            },
        ],
    };
    assert_eq!(order.total().unwrap(), Decimal::new(1500, 2));
    assert!(order.validate().is_ok());
}
