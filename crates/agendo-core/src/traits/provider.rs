// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM chat-completion backends.

use async_trait::async_trait;

use crate::error::AgendoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for LLM provider integrations.
///
/// A completion returns either final text or a set of tool calls the caller
/// is expected to execute and echo back.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, AgendoError>;
}
