//! HTTP server implementation using Axum.

use crate::handlers::{handle_health, handle_rpc};
use appdeck_core::IconService;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Requests handled at once. Each resolution already fans out internally.
const MAX_CONCURRENT_REQUESTS: usize = 16;

/// Application state shared across handlers.
pub struct AppState {
    pub service: IconService,
}

/// Build the router without binding it.
pub fn router(service: IconService) -> Router {
    let state = Arc::new(AppState { service });

    // The frontend loads from file:// or a dev server; allow any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(service: IconService, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = router(service);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
