use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use stockbook_infra::OrderRequestLine;
use stockbook_orders::{DecisionRequest, OrderStatus};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/decide", post(decide_order))
        .route("/:id/delivery-status", put(set_delivery_status))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let store = match dto::parse_store(&body.store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut lines = Vec::with_capacity(body.lines.len());
    for line in &body.lines {
        let code = match dto::parse_item(&line.code) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        lines.push(OrderRequestLine {
            code,
            qty: line.qty,
        });
    }

    match services
        .orders
        .submit_order(store, body.requested_by, body.order_date, lines)
    {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub store: Option<String>,
    pub status: Option<String>,
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListOrdersQuery>,
) -> axum::response::Response {
    let store = match &query.store {
        Some(s) => match dto::parse_store(s) {
            Ok(s) => Some(s),
            Err(resp) => return resp,
        },
        None => None,
    };
    let status = match &query.status {
        Some(s) => match s.parse::<OrderStatus>() {
            Ok(s) => Some(s),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    "status must be one of: pending, approved, rejected, hold",
                )
            }
        },
        None => None,
    };

    match services.orders.list_orders(store.as_ref(), status) {
        Ok(orders) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": orders.len(),
                "orders": orders.iter().map(dto::order_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.orders.get_order(id) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn decide_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<DecisionRequest>,
) -> axum::response::Response {
    let id = match dto::parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.orders.decide_order(id, &body) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct NextInvoiceQuery {
    pub date: Option<NaiveDate>,
}

/// Allocate the next invoice number for a day (today by default). The
/// sequence is consumed on allocation; gaps are acceptable.
pub async fn next_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<NextInvoiceQuery>,
) -> axum::response::Response {
    let day = query.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    match services.orders.next_invoice_number(day) {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "invoice_number": invoice.as_str(),
                "day": day,
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn set_delivery_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeliveryStatusRequest>,
) -> axum::response::Response {
    let id = match dto::parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.orders.set_delivery_status(id, body.delivery_status) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
