use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockbook_core::Error;

/// Map domain/storage errors to the JSON error envelope.
pub fn error_to_response(err: Error) -> axum::response::Response {
    match err {
        Error::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        Error::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        Error::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        Error::PartialWrite(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "partial_write", msg)
        }
        Error::Storage(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
