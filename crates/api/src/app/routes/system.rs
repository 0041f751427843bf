use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn list_stores(
    Extension(services): Extension<Arc<AppServices>>,
) -> impl IntoResponse {
    let stores: Vec<String> = services
        .stores
        .list()
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();
    Json(serde_json::json!({ "stores": stores }))
}

#[derive(Debug, Deserialize)]
pub struct VendorsQuery {
    #[serde(rename = "type")]
    pub vendor_type: String,
}

pub async fn list_vendors(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<VendorsQuery>,
) -> impl IntoResponse {
    let vendors = services.vendors.list_by_type(&query.vendor_type);
    Json(serde_json::json!({
        "type": query.vendor_type,
        "vendors": vendors,
    }))
}
