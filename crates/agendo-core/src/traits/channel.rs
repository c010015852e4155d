// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport adapter trait.

use async_trait::async_trait;

use crate::error::AgendoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageId, OutboundMessage};

/// Outbound side of the chat transport.
///
/// Inbound messages are pushed into the engine by the transport itself, so
/// only delivery is modelled here.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Delivers a text message to an address.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgendoError>;
}
