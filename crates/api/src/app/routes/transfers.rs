use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/force", post(force_transfer))
}

/// Push stock to stores without an order. One invoice per destination
/// covers its whole batch.
pub async fn force_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ForceTransferBatchRequest>,
) -> axum::response::Response {
    match services
        .orders
        .force_outbound_batch(body.transfers, body.occurred_at)
    {
        Ok(invoices) => {
            let invoices: serde_json::Map<String, serde_json::Value> = invoices
                .iter()
                .map(|(store, invoice)| {
                    (store.to_string(), serde_json::json!(invoice.as_str()))
                })
                .collect();
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "invoices": invoices })),
            )
                .into_response()
        }
        Err(e) => errors::error_to_response(e),
    }
}
