// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use agendo_core::{AgendoError, InboundMessage};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Channel feeding inbound messages to the serve loop.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(inbound_tx: mpsc::Sender<InboundMessage>, bearer_token: Option<String>) -> Self {
        Self {
            inbound_tx,
            auth: AuthConfig { bearer_token },
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        }
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from agendo-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the gateway routes:
/// - GET /health (public)
/// - POST /v1/inbound (bearer token when configured)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/inbound", post(handlers::post_inbound))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Binds to `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), AgendoError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AgendoError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AgendoError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}
