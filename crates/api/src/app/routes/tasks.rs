use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use stockbook_core::OwnerId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/open", get(open_items))
        .route("/close-day", post(close_day))
}

fn resolve_owner(
    services: &AppServices,
    raw_name: &str,
) -> Result<OwnerId, axum::response::Response> {
    services.employees.resolve_owner(raw_name).ok_or_else(|| {
        errors::json_error(
            StatusCode::NOT_FOUND,
            "unknown_owner",
            format!("no employee named {raw_name:?}"),
        )
    })
}

#[derive(Debug, Deserialize)]
pub struct OpenItemsQuery {
    pub date: NaiveDate,
    pub owner: String,
}

pub async fn open_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<OpenItemsQuery>,
) -> axum::response::Response {
    let owner = match resolve_owner(&services, &query.owner) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };

    match services.tasks.load_open_items(owner, query.date) {
        Ok(open) => (StatusCode::OK, Json(dto::open_items_to_json(&open))).into_response(),
        Err(e) => errors::error_to_response(e),
    }
}

pub async fn close_day(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CloseDayRequest>,
) -> axum::response::Response {
    let owner = match resolve_owner(&services, &body.owner) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let owner_label = body.owner_label.as_deref().unwrap_or(&body.owner);

    match services
        .tasks
        .close_day(body.date, owner, owner_label, body.items)
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "finished": summary.finished,
                "carried_over": summary.carried_over,
            })),
        )
            .into_response(),
        Err(e) => errors::error_to_response(e),
    }
}
