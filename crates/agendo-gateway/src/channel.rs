// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound [`ChannelAdapter`] posting texts to the transport bridge.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use agendo_core::{
    AdapterType, AgendoError, ChannelAdapter, HealthStatus, MessageId, OutboundMessage,
    PluginAdapter,
};

/// Bridge connection settings (mirrors the bridge fields of `GatewayConfig`).
#[derive(Clone)]
pub struct HttpChannelConfig {
    pub bridge_url: String,
    pub bridge_token: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChannelConfig")
            .field("bridge_url", &self.bridge_url)
            .field("bridge_token", &self.bridge_token.as_ref().map(|_| "[redacted]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    address: &'a str,
    text: &'a str,
    tenant_id: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Delivers outbound messages with `POST {bridge_url}/send`.
pub struct HttpChannel {
    client: reqwest::Client,
    send_url: String,
}

impl HttpChannel {
    pub fn new(config: &HttpChannelConfig) -> Result<Self, AgendoError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = config.bridge_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AgendoError::Config(format!("invalid bridge token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgendoError::Channel {
                message: format!("failed to build bridge HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            send_url: format!("{}/send", config.bridge_url.trim_end_matches('/')),
        })
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl PluginAdapter for HttpChannel {
    fn name(&self) -> &str {
        "http-bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, AgendoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AgendoError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for HttpChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgendoError> {
        let body = SendRequest {
            address: &msg.address,
            text: &msg.text,
            tenant_id: msg.tenant_id.as_deref(),
        };

        let response = self
            .client
            .post(&self.send_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgendoError::Channel {
                message: format!("bridge request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgendoError::Channel {
                message: format!("bridge rejected message ({status}): {detail}"),
                source: None,
            });
        }

        let parsed: SendResponse = response.json().await.unwrap_or_default();
        let id = parsed
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        debug!(address = %msg.address, message_id = %id, "delivered to bridge");
        Ok(MessageId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(url: &str, token: Option<&str>) -> HttpChannel {
        HttpChannel::new(&HttpChannelConfig {
            bridge_url: url.to_string(),
            bridge_token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn outbound() -> OutboundMessage {
        OutboundMessage {
            address: "5511999990000".into(),
            text: "Olá!".into(),
            tenant_id: Some("t1".into()),
        }
    }

    #[test]
    fn send_url_is_joined_without_double_slash() {
        assert_eq!(channel("http://bridge:8080/", None).send_url(), "http://bridge:8080/send");
    }

    #[tokio::test]
    async fn posts_message_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer bridge-secret"))
            .and(body_json(json!({
                "address": "5511999990000",
                "text": "Olá!",
                "tenant_id": "t1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "wamid-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = channel(&server.uri(), Some("bridge-secret"))
            .send(outbound())
            .await
            .unwrap();
        assert_eq!(id.0, "wamid-1");
    }

    #[tokio::test]
    async fn missing_id_gets_generated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let id = channel(&server.uri(), None).send(outbound()).await.unwrap();
        assert!(!id.0.is_empty());
    }

    #[tokio::test]
    async fn rejection_is_a_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(502).set_body_string("device offline"))
            .mount(&server)
            .await;

        let err = channel(&server.uri(), None).send(outbound()).await.unwrap_err();
        assert!(matches!(err, AgendoError::Channel { .. }));
        assert!(err.to_string().contains("device offline"));
    }
}
