use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use stockbook_infra::{AdjustmentRequest, InboundReceipt, MovementFilter, UsageEntry};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:store", get(get_stock))
        .route("/:store/status", get(get_stock_status))
}

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(store): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> axum::response::Response {
    let store = match dto::parse_store(&store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.stock.get_stock(&store, query.as_of) {
        Ok(balances) => {
            let balances: serde_json::Map<String, serde_json::Value> = balances
                .iter()
                .map(|(code, qty)| (code.to_string(), serde_json::json!(qty)))
                .collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "store": store.as_str(),
                    "as_of": query.as_of,
                    "balances": balances,
                })),
            )
                .into_response()
        }
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn get_stock_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(store): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> axum::response::Response {
    let store = match dto::parse_store(&store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.stock.get_stock_status(&store, query.as_of) {
        Ok(lines) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "store": store.as_str(),
                "as_of": query.as_of,
                "items": lines.iter().map(dto::status_line_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub store: Option<String>,
    pub item: Option<String>,
    pub kind: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `asc` for oldest-first; the default is newest-first.
    pub order: Option<String>,
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<MovementsQuery>,
) -> axum::response::Response {
    let mut filter = MovementFilter::default();
    if let Some(store) = &query.store {
        filter.store = match dto::parse_store(store) {
            Ok(s) => Some(s),
            Err(resp) => return resp,
        };
    }
    if let Some(item) = &query.item {
        filter.item_code = match dto::parse_item(item) {
            Ok(i) => Some(i),
            Err(resp) => return resp,
        };
    }
    if let Some(kind) = &query.kind {
        filter.kinds = match dto::parse_kind(kind) {
            Ok(k) => Some(vec![k]),
            Err(resp) => return resp,
        };
    }
    filter = filter.occurred_between(query.from, query.to);
    if query.order.as_deref() == Some("asc") {
        filter = filter.ascending();
    }

    match services.stock.list_movements(&filter) {
        Ok(movements) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": movements.len(),
                "movements": movements.iter().map(dto::movement_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn register_receipts(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReceiptRequest>,
) -> axum::response::Response {
    let store = match dto::parse_store(&body.store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut receipts = Vec::with_capacity(body.lines.len());
    for line in &body.lines {
        let code = match dto::parse_item(&line.code) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        receipts.push(InboundReceipt {
            store: store.clone(),
            code,
            qty: line.qty,
            occurred_at: body.occurred_at,
            counterpart: body.counterpart.clone(),
        });
    }

    match services.stock.register_inbound_batch(receipts) {
        Ok(ids) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "movements_written": ids.len(),
                "movement_ids": ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn record_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UsageRequest>,
) -> axum::response::Response {
    let store = match dto::parse_store(&body.store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut entries = Vec::with_capacity(body.lines.len());
    for line in &body.lines {
        let code = match dto::parse_item(&line.code) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        entries.push(UsageEntry {
            store: store.clone(),
            code,
            qty: line.qty,
            occurred_at: body.occurred_at,
            reason: body.reason.clone(),
        });
    }

    match services.stock.record_usage_batch(entries) {
        Ok(ids) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "movements_written": ids.len() })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AdjustmentBatchRequest>,
) -> axum::response::Response {
    let store = match dto::parse_store(&body.store) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut requests = Vec::with_capacity(body.counts.len());
    for count in &body.counts {
        let code = match dto::parse_item(&count.code) {
            Ok(c) => c,
            Err(resp) => return resp,
        };
        requests.push(AdjustmentRequest {
            store: store.clone(),
            code,
            counted_qty: count.counted_qty,
            occurred_at: body.occurred_at,
            note: body.note.clone(),
        });
    }

    match services.stock.adjust_stock_batch(requests) {
        Ok(ids) => (
            StatusCode::OK,
            Json(serde_json::json!({
                // Counts already matching the ledger write no row.
                "movements_written": ids.len(),
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
