//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/engine wiring (in-memory or Postgres)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use stockbook_directory::InMemoryDirectory;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// The directory is injected so tests and the dev server can seed
/// reference data; production wiring replaces it with adapters over the
/// external item/store/employee systems.
pub async fn build_app(
    config: services::ServiceConfig,
    directory: Arc<InMemoryDirectory>,
) -> anyhow::Result<Router> {
    let app_services = Arc::new(services::build_services(config, directory).await?);

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(app_services)))
}
