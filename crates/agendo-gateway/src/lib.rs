// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport bridge.
//!
//! The bridge (a WhatsApp connector or similar) posts inbound messages to the
//! axum webhook in [`server`]; handlers push them onto an mpsc channel read by
//! the serve loop. Replies go back out through [`HttpChannel`], which posts
//! each text to the bridge's `/send` endpoint.

pub mod auth;
pub mod channel;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use channel::{HttpChannel, HttpChannelConfig};
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
