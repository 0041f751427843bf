use std::sync::Arc;

use stockbook_api::app::services::ServiceConfig;
use stockbook_directory::InMemoryDirectory;

#[tokio::main]
async fn main() {
    stockbook_observability::init();

    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("invalid configuration: {e}");
        std::process::exit(1);
    });

    // Reference data comes from external systems in production; the dev
    // server starts with an empty directory populated via the admin tooling.
    let directory = Arc::new(InMemoryDirectory::new());

    let app = match stockbook_api::app::build_app(config, directory).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("failed to build application: {e}");
            std::process::exit(1);
        }
    };

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
