// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles POST /v1/inbound and GET /health.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;

use agendo_core::InboundMessage;

use crate::server::GatewayState;

/// Request body for POST /v1/inbound.
#[derive(Debug, Deserialize)]
pub struct InboundRequest {
    /// Sender address as delivered by the bridge.
    pub address: String,
    pub text: String,
    /// Tenant whose connected number received the message.
    #[serde(default)]
    pub tenant_hint: Option<String>,
    /// The tenant wrote from its own connected device.
    #[serde(default)]
    pub self_channel: bool,
}

/// Response body for an accepted inbound message.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /v1/inbound
///
/// Queues the message for the engine and answers 202 without waiting for
/// the turn; replies travel back through the bridge.
pub async fn post_inbound(
    State(state): State<GatewayState>,
    Json(body): Json<InboundRequest>,
) -> Response {
    if body.address.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "address is required");
    }

    let mut msg = InboundMessage::new(body.address, body.text);
    if let Some(tenant) = body.tenant_hint.filter(|t| !t.trim().is_empty()) {
        msg = msg.with_tenant_hint(tenant);
    }
    if body.self_channel {
        msg = msg.from_self_channel();
    }

    match state.inbound_tx.try_send(msg) {
        Ok(()) => (StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })).into_response(),
        Err(TrySendError::Full(_)) => {
            tracing::warn!("inbound queue full, rejecting message");
            error(StatusCode::SERVICE_UNAVAILABLE, "engine busy")
        }
        Err(TrySendError::Closed(_)) => {
            error(StatusCode::SERVICE_UNAVAILABLE, "engine shutting down")
        }
    }
}

/// GET /health
///
/// Public liveness probe.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}
