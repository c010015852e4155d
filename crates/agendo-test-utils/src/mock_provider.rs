// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use agendo_core::{
    AdapterType, AgendoError, CompletionRequest, CompletionResponse, HealthStatus, PluginAdapter,
    ProviderAdapter, ToolCall,
};

enum Scripted {
    Reply(CompletionResponse),
    Fail(String),
}

/// A mock LLM provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty, an
/// empty text response is returned. Every request is recorded.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a plain text answer.
    pub async fn add_text(&self, text: impl Into<String>) {
        self.add_response(CompletionResponse::text(text)).await;
    }

    /// Queue an answer that calls a single tool.
    pub async fn add_tool_call(&self, name: &str, arguments: serde_json::Value) {
        let served = self.requests.lock().await.len();
        let queued = self.responses.lock().await.len();
        let count = served + queued;
        self.add_response(CompletionResponse {
            text: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{count}"),
                name: name.to_string(),
                arguments,
            }],
        })
        .await;
    }

    pub async fn add_response(&self, response: CompletionResponse) {
        self.responses.lock().await.push_back(Scripted::Reply(response));
    }

    /// Queue a provider failure.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Scripted::Fail(message.into()));
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Number of scripted responses not yet consumed.
    pub async fn pending(&self) -> usize {
        self.responses.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, AgendoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AgendoError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AgendoError> {
        self.requests.lock().await.push(request);
        match self.responses.lock().await.pop_front() {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(AgendoError::provider(message)),
            None => Ok(CompletionResponse::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_order_then_empty() {
        let provider = MockProvider::new();
        provider.add_text("first").await;
        provider.add_failure("boom").await;

        let first = provider.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(first.text, "first");
        assert!(provider.complete(CompletionRequest::default()).await.is_err());
        let empty = provider.complete(CompletionRequest::default()).await.unwrap();
        assert!(empty.text.is_empty());
        assert_eq!(provider.request_count().await, 3);
    }

    #[tokio::test]
    async fn tool_call_ids_are_distinct() {
        let provider = MockProvider::new();
        provider.add_tool_call("list_services", serde_json::json!({})).await;
        provider.add_tool_call("list_services", serde_json::json!({})).await;
        let a = provider.complete(CompletionRequest::default()).await.unwrap();
        let b = provider.complete(CompletionRequest::default()).await.unwrap();
        assert_ne!(a.tool_calls[0].id, b.tool_calls[0].id);
    }
}
