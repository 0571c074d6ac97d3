//! Order handlers.
//!
//! - `GET  /api/orders`                     newest first, `?limit=` clamped
//! - `POST /api/orders`                     place an order; total computed here
//! - `GET  /api/orders/{id}`                one order with its items
//! - `GET  /api/orders/{id}/supplier-urls`  listings to buy from for fulfilment

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utrabeauty_db::{NewOrder, NewOrderItem, OrderRow, OrderWithItems};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_json_rejection, map_query_rejection, normalize_limit, ApiError,
    ApiResponse, AppState,
};

const DEFAULT_CURRENCY: &str = "USD";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ListOrdersQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub shipping_address: Option<String>,
    pub currency: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderItem {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub supplier_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SupplierUrls {
    order_id: Uuid,
    supplier_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn required(req_id: &str, field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(req_id, "validation_error", format!("{field} is required")))
}

fn parse_order_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            req_id,
            "not_found",
            format!("order '{raw}' not found"),
        )
    })
}

fn map_order_error(req_id: &str, id: &str, error: &utrabeauty_db::DbError) -> ApiError {
    if matches!(error, utrabeauty_db::DbError::NotFound) {
        ApiError::new(req_id, "not_found", format!("order '{id}' not found"))
    } else {
        map_db_error(req_id.to_owned(), error)
    }
}

fn validate_currency(req_id: &str, value: Option<String>) -> Result<String, ApiError> {
    let currency = value.map_or_else(|| DEFAULT_CURRENCY.to_owned(), |c| c.trim().to_uppercase());
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(currency)
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("currency must be a 3-letter ISO code, got '{currency}'"),
        ))
    }
}

impl CreateOrderRequest {
    fn into_new_order(self, req_id: &str) -> Result<NewOrder, ApiError> {
        let customer_email = required(req_id, "customer_email", self.customer_email)?;
        let customer_name = required(req_id, "customer_name", self.customer_name)?;
        let shipping_address = required(req_id, "shipping_address", self.shipping_address)?;
        let currency = validate_currency(req_id, self.currency)?;

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let product_id =
                    required(req_id, &format!("items[{index}].product_id"), item.product_id)?;
                Ok::<_, ApiError>(NewOrderItem {
                    product_name: item
                        .product_name
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| product_id.clone()),
                    product_id,
                    quantity: item.quantity.ok_or_else(|| {
                        ApiError::new(
                            req_id,
                            "validation_error",
                            format!("items[{index}].quantity is required"),
                        )
                    })?,
                    unit_price: item.unit_price.ok_or_else(|| {
                        ApiError::new(
                            req_id,
                            "validation_error",
                            format!("items[{index}].unit_price is required"),
                        )
                    })?,
                    supplier_url: item.supplier_url,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let order = NewOrder {
            user_public_id: self.user_id,
            customer_email,
            customer_name,
            shipping_address,
            currency,
            items,
        };
        // Quantity, price and item-count rules live with the row type.
        order
            .validate()
            .and_then(|()| order.total())
            .map_err(|e| map_db_error(req_id.to_owned(), &e))?;
        Ok(order)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<OrderRow>>>, ApiError> {
    let Query(query) = query.map_err(|e| map_query_rejection(req_id.0.clone(), &e))?;
    let rows = utrabeauty_db::list_orders(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(rows, req_id.0)))
}

pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithItems>>), ApiError> {
    let Json(body) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let order = body.into_new_order(&req_id.0)?;

    let created = utrabeauty_db::create_order(&state.pool, &order)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        order_id = %created.order.public_id,
        items = created.items.len(),
        total = %created.order.total,
        "order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(created, req_id.0)),
    ))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderWithItems>>, ApiError> {
    let public_id = parse_order_id(&req_id.0, &id)?;
    let order = utrabeauty_db::get_order(&state.pool, public_id)
        .await
        .map_err(|e| map_order_error(&req_id.0, &id, &e))?;

    Ok(Json(ApiResponse::new(order, req_id.0)))
}

pub(super) async fn order_supplier_urls(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SupplierUrls>>, ApiError> {
    let public_id = parse_order_id(&req_id.0, &id)?;
    let supplier_urls = utrabeauty_db::order_supplier_urls(&state.pool, public_id)
        .await
        .map_err(|e| map_order_error(&req_id.0, &id, &e))?;

    Ok(Json(ApiResponse::new(
        SupplierUrls {
            order_id: public_id,
            supplier_urls,
        },
        req_id.0,
    )))
}
