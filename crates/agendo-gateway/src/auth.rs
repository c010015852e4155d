// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware for the inbound webhook.
//!
//! With no token configured the webhook is open; the bridge is expected to run
//! on a private network in that setup.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the gateway.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables auth.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    /// Returns true when the `Authorization` header value grants access.
    pub fn permits(&self, header: Option<&str>) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return true;
        };
        header
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    if auth.permits(header) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!("inbound webhook rejected: bad or missing bearer token");
        Err(StatusCode::UNAUTHORIZED)
    }
}
