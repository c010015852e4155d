// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter for the Agendo scheduling engine.
//!
//! Implements [`ProviderAdapter`] over the chat-completions API with
//! function-style tool calls.

pub mod client;
pub mod types;

use std::time::Duration;

use agendo_config::AgendoConfig;
use agendo_core::{
    AdapterType, AgendoError, ChatMessage, ChatRole, CompletionRequest, CompletionResponse,
    HealthStatus, PluginAdapter, ProviderAdapter, ToolCall,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;
use crate::types::{
    ApiFunction, ApiFunctionCall, ApiMessage, ApiTool, ApiToolCall, ChatRequest, ChatResponse,
};

/// OpenAI provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &AgendoConfig) -> Result<Self, AgendoError> {
        let api_key = resolve_api_key(config.provider.api_key.as_deref())?;
        let client = OpenAiClient::new(
            &api_key,
            &config.provider.base_url,
            Duration::from_secs(config.provider.timeout_secs),
        )?;
        info!(
            model = config.provider.model.as_str(),
            endpoint = client.endpoint(),
            "OpenAI provider initialized"
        );
        Ok(Self::with_client(client, config.provider.model.clone()))
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient, model: String) -> Self {
        Self { client, model }
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.trim().is_empty() {
            messages.push(ApiMessage {
                role: ChatRole::System.to_string(),
                content: Some(request.system_prompt.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }
        messages.extend(request.messages.iter().map(to_api_message));

        let tools = request
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty())
            .map(|tools| {
                tools
                    .iter()
                    .map(|t| ApiTool {
                        type_: "function".to_string(),
                        function: ApiFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect()
            });

        ChatRequest {
            model: self.model.clone(),
            messages,
            tools,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

fn resolve_api_key(configured: Option<&str>) -> Result<String, AgendoError> {
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            AgendoError::Config(
                "no OpenAI API key: set provider.api_key or OPENAI_API_KEY".to_string(),
            )
        })
}

fn to_api_message(message: &ChatMessage) -> ApiMessage {
    let tool_calls: Vec<ApiToolCall> = message
        .tool_calls
        .iter()
        .map(|call| ApiToolCall {
            id: call.id.clone(),
            type_: "function".to_string(),
            function: ApiFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        })
        .collect();
    let content = if message.content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(message.content.clone())
    };
    ApiMessage {
        role: message.role.to_string(),
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn from_chat_response(response: ChatResponse) -> Result<CompletionResponse, AgendoError> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(AgendoError::provider("completion returned no choices"));
    };
    debug!(finish_reason = ?choice.finish_reason, tool_calls = choice.message.tool_calls.len(), "completion mapped");
    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
                warn!(tool = %call.function.name, error = %e, "unparsable tool arguments, using {{}}");
                serde_json::json!({})
            });
            ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            }
        })
        .collect();
    Ok(CompletionResponse {
        text: choice.message.content.unwrap_or_default(),
        tool_calls,
    })
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AgendoError> {
        let api_request = self.to_chat_request(&request);
        let response = self.client.complete(&api_request).await?;
        from_chat_response(response)
    }
}
