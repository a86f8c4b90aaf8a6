//! Server — Axum JSON API for the game front-end.
//!
//! The presentation boundary: a browser client renders the coin and calls
//! these routes. CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::table::SharedTable;

/// Bind `port` and serve until `shutdown` resolves.
pub async fn serve(
    table: SharedTable,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(table);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind game server port {port}"))?;
    info!(port, "Game server listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Game server error")
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(table: SharedTable) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/state", get(routes::get_state))
        .route("/api/call", post(routes::select_call))
        .route("/api/bet", post(routes::set_bet))
        .route("/api/flip", post(routes::flip))
        .route("/api/cash-out", post(routes::cash_out))
        .route("/api/reset", post(routes::reset))
        .route("/api/events", get(routes::get_events))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
