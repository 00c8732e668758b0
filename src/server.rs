//! MCP streamable-HTTP server.
//!
//! Mounts the [`KgraphMcp`](crate::mcp::KgraphMcp) bridge under `/mcp` using
//! rmcp's streamable HTTP transport (one multiplexed session per client) and
//! exposes a liveness probe at `GET /healthz` that answers `ok` regardless
//! of backend health.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin MCP tool calls.

use anyhow::Result;
use axum::{routing::get, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::{self, GraphBackend};
use crate::config::Config;
use crate::mcp::KgraphMcp;

/// Resolve the backend from configuration and serve.
///
/// Backend selection happens before the router exists: a misconfigured
/// deployment fails here and never serves partial functionality.
pub async fn run_server(config: &Config) -> Result<()> {
    let backend = backend::select_backend(config)?;
    serve_with_backend(config, backend).await
}

/// Serve with an already-constructed backend instance.
///
/// Split out from [`run_server`] so tests can inject a mock backend.
pub async fn serve_with_backend(config: &Config, backend: Arc<dyn GraphBackend>) -> Result<()> {
    let app = build_router(backend);

    tracing::info!(bind = %config.bind, "kgraph MCP server listening");
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the full router: MCP endpoint, liveness probe, permissive CORS.
pub fn build_router(backend: Arc<dyn GraphBackend>) -> Router {
    let handler = KgraphMcp::new(backend);
    let mcp_service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(handle_healthz))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
}

/// Handler for `GET /healthz`. Fixed plain-text response with success
/// status, independent of backend health.
async fn handle_healthz() -> &'static str {
    "ok"
}
