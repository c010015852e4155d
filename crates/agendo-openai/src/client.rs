// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Provides [`OpenAiClient`] which handles authentication, request
//! serialization and transient error retry.

use std::time::Duration;

use agendo_core::AgendoError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for chat-completions communication.
///
/// Retries once on transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// Creates a client posting to `{base_url}/chat/completions`.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AgendoError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| AgendoError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert("authorization", bearer);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AgendoError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a completion request and returns the parsed response.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AgendoError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| AgendoError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| AgendoError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| AgendoError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(AgendoError::provider(format!("API returned {status}: {body}")));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(AgendoError::provider(message));
        }

        Err(last_error
            .unwrap_or_else(|| AgendoError::provider("completion request failed after retries")))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("test-key", base_url, Duration::from_secs(5)).unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![crate::types::ApiMessage {
                role: "user".into(),
                content: Some("Olá".into()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            }],
            tools: None,
            max_tokens: Some(64),
            temperature: Some(0.0),
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = test_client("http://localhost:9/v1/");
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn complete_sends_bearer_and_parses_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Oi!")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri()).complete(&test_request()).await.unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Oi!"));
    }

    #[tokio::test]
    async fn complete_retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("depois")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri()).complete(&test_request()).await.unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("depois"));
    }

    #[tokio::test]
    async fn complete_reports_api_error_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "bad model"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        assert!(test_client(&server.uri()).complete(&test_request()).await.is_err());
    }
}
