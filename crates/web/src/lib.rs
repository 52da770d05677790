//! HTTP layer: the chat front-end and the embedded CRM tool host.
//!
//! The router exposes the chat surface (`/`, `/health`, `/chat`) and nests
//! the tool-host endpoint under `/mcp`, so one process can serve the chat UI
//! and the tool host it talks to. Either side can also run against a remote
//! peer.

pub mod crm;
pub mod routes;
pub mod state;
pub mod toolhost;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use crm::CrmClient;
pub use state::AppState;
pub use toolhost::ToolHostState;

/// Build the complete application router.
pub fn app(state: AppState, toolhost: ToolHostState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/chat", post(routes::chat))
        .with_state(state)
        .nest("/mcp", toolhost::routes(toolhost))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Build a router serving only the tool host, for running it standalone.
pub fn toolhost_app(toolhost: ToolHostState) -> Router {
    toolhost::routes(toolhost)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process receives an interrupt signal.
pub async fn serve(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "web server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
}
