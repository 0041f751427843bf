use axum::{
    routing::{get, post},
    Router,
};

pub mod orders;
pub mod stock;
pub mod system;
pub mod tasks;
pub mod transfers;

/// Router for all ledger endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/stores", get(system::list_stores))
        .route("/vendors", get(system::list_vendors))
        .route("/movements", get(stock::list_movements))
        .route("/receipts", post(stock::register_receipts))
        .route("/usage", post(stock::record_usage))
        .route("/adjustments", post(stock::adjust_stock))
        .route("/invoices/next", post(orders::next_invoice))
        .nest("/stock", stock::router())
        .nest("/orders", orders::router())
        .nest("/transfers", transfers::router())
        .nest("/tasks", tasks::router())
}
