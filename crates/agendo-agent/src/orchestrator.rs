// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI tool-calling orchestrator.
//!
//! One completion with the role-filtered tool catalog. When the model asks
//! for tools, each call is checked against the allow-list, executed in
//! order, and a second completion without tools produces the final answer.

use std::sync::Arc;

use agendo_core::{
    Account, AccountRole, AgendoError, ChatMessage, Clock, CompletionRequest, ProviderAdapter,
    StorageAdapter, ToolCall,
};
use agendo_skill::{RoleAllowList, ToolOutput, ToolRegistry, ToolRole, ToolScope};
use tracing::{debug, info, warn};

use crate::agenda::{agenda_for, format_agenda};

/// Picks the tool role for a speaker.
///
/// Management turns without an account come from the tenant's own channel
/// and act as the owner.
pub fn derive_role(account: Option<&Account>, management: bool) -> ToolRole {
    match account.map(|a| a.role) {
        Some(AccountRole::SuperAdmin) => ToolRole::SuperAdmin,
        Some(AccountRole::Owner) => ToolRole::Owner,
        Some(AccountRole::Staff) => ToolRole::Staff,
        None if management => ToolRole::Owner,
        _ => ToolRole::Client,
    }
}

/// One conversational request to the model.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub text: String,
    pub scope: ToolScope,
    pub system_prompt: String,
}

/// Generation settings shared by every orchestrated completion.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Inject the day's agenda into management prompts.
    pub briefing: bool,
}

pub struct Orchestrator {
    provider: Arc<dyn ProviderAdapter>,
    registry: ToolRegistry,
    allow: RoleAllowList,
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    settings: GenerationSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        registry: ToolRegistry,
        allow: RoleAllowList,
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        settings: GenerationSettings,
    ) -> Self {
        info!(
            tools = registry.len(),
            briefing = settings.briefing,
            "orchestrator initialized"
        );
        Self {
            provider,
            registry,
            allow,
            storage,
            clock,
            settings,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn allow_list(&self) -> &RoleAllowList {
        &self.allow
    }

    async fn briefing(&self, scope: &ToolScope) -> Result<String, AgendoError> {
        let today = self.clock.today();
        let entries = agenda_for(
            self.storage.as_ref(),
            &scope.roster,
            &today.format("%Y-%m-%d").to_string(),
        )
        .await?;
        Ok(format_agenda(&entries, today))
    }

    async fn system_prompt(&self, turn: &AgentTurn) -> String {
        let mut prompt = turn.system_prompt.clone();
        prompt.push_str(&format!(
            "\nData de hoje: {}.",
            self.clock.today().format("%Y-%m-%d")
        ));
        if self.settings.briefing && turn.scope.role.is_management() {
            match self.briefing(&turn.scope).await {
                Ok(digest) => {
                    prompt.push_str("\n\nResumo do dia:\n");
                    prompt.push_str(&digest);
                }
                Err(e) => warn!(error = %e, "briefing unavailable"),
            }
        }
        prompt
    }

    fn request(
        &self,
        system_prompt: String,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<agendo_core::ToolSchema>>,
    ) -> CompletionRequest {
        CompletionRequest {
            system_prompt,
            messages,
            tools,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        }
    }

    async fn execute(&self, scope: &ToolScope, call: &ToolCall) -> ToolOutput {
        if !self.allow.allows(scope.role, &call.name) {
            warn!(tool = %call.name, role = %scope.role, "model requested a tool outside the role");
            return ToolOutput::error(format!("tool {} is not available", call.name));
        }
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return ToolOutput::error(format!("tool {} is not available", call.name));
        };
        match tool.invoke(scope, call.arguments.clone()).await {
            Ok(output) => {
                debug!(tool = %call.name, is_error = output.is_error, "tool executed");
                output
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                ToolOutput::error(e.to_string())
            }
        }
    }

    /// Answers a free-text message, possibly acting through tools.
    pub async fn run(&self, turn: AgentTurn) -> Result<String, AgendoError> {
        let text = turn.text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let system_prompt = self.system_prompt(&turn).await;
        let schemas = self.registry.schemas_for(turn.scope.role, &self.allow);
        let tools = (!schemas.is_empty()).then_some(schemas);

        let mut messages = vec![ChatMessage::user(text)];
        let first = self
            .provider
            .complete(self.request(system_prompt.clone(), messages.clone(), tools))
            .await?;
        if first.tool_calls.is_empty() {
            return Ok(first.text);
        }

        debug!(calls = first.tool_calls.len(), role = %turn.scope.role, "executing tool calls");
        messages.push(ChatMessage::assistant(first.text.clone(), first.tool_calls.clone()));
        for call in &first.tool_calls {
            let output = self.execute(&turn.scope, call).await;
            let content = if output.is_error {
                serde_json::json!({ "error": output.content }).to_string()
            } else {
                output.content
            };
            messages.push(ChatMessage::tool_result(call.id.clone(), content));
        }

        let second = self
            .provider
            .complete(self.request(system_prompt, messages, None))
            .await?;
        Ok(second.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, harness, seed_appointment, seed_service};
    use agendo_core::{ChatRole, CompletionResponse, PaymentStatus};
    use serde_json::json;

    fn client_scope() -> ToolScope {
        ToolScope {
            role: ToolRole::Client,
            tenant_id: Some("o1".into()),
            calendar_id: Some("o1".into()),
            roster: vec!["o1".into()],
            caller_account_id: Some("c1".into()),
            caller_phone: "5511911111111".into(),
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: format!("call-{name}"),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn role_derivation() {
        let owner = account("o1", "5511900000001", AccountRole::Owner);
        let staff = account("s1", "5511900000002", AccountRole::Staff);
        let admin = account("x1", "5511900000003", AccountRole::SuperAdmin);
        let client = account("c1", "5511900000004", AccountRole::Client);
        assert_eq!(derive_role(Some(&owner), true), ToolRole::Owner);
        assert_eq!(derive_role(Some(&staff), true), ToolRole::Staff);
        assert_eq!(derive_role(Some(&admin), true), ToolRole::SuperAdmin);
        assert_eq!(derive_role(Some(&client), false), ToolRole::Client);
        assert_eq!(derive_role(None, true), ToolRole::Owner);
        assert_eq!(derive_role(None, false), ToolRole::Client);
    }

    #[tokio::test]
    async fn blank_text_skips_the_model() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        let reply = h
            .ctx
            .orchestrator
            .run(AgentTurn {
                text: "   ".into(),
                scope: client_scope(),
                system_prompt: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "");
        assert!(h.provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn plain_answer_uses_one_completion_with_client_catalog() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        h.provider.add_response(CompletionResponse::text("Abrimos às 9h.")).await;
        let reply = h
            .ctx
            .orchestrator
            .run(AgentTurn {
                text: "que horas abre?".into(),
                scope: client_scope(),
                system_prompt: "Assistente".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "Abrimos às 9h.");

        let requests = h.provider.requests().await;
        assert_eq!(requests.len(), 1);
        let names: Vec<String> = requests[0]
            .tools
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert!(names.contains(&"create_appointment".to_string()));
        assert!(!names.contains(&"mark_paid".to_string()));
    }

    #[tokio::test]
    async fn client_cannot_execute_management_tool() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        h.storage
            .upsert_account(&account("c1", "5511911111111", AccountRole::Client))
            .await
            .unwrap();
        seed_service(&h, "s1", "o1", "Corte", 4500).await;
        seed_appointment(&h, "a1", "o1", "c1", "2025-06-03", "10:00").await;

        h.provider
            .add_response(CompletionResponse {
                text: String::new(),
                tool_calls: vec![call("mark_paid", json!({"appointment_id": "a1"}))],
            })
            .await;
        h.provider.add_response(CompletionResponse::text("Não posso fazer isso.")).await;

        let reply = h
            .ctx
            .orchestrator
            .run(AgentTurn {
                text: "marca meu horário como pago".into(),
                scope: client_scope(),
                system_prompt: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "Não posso fazer isso.");

        let stored = h.storage.get_appointment("a1").await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);

        let requests = h.provider.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_none());
        let tool_msg = requests[1]
            .messages
            .iter()
            .find(|m| m.role == ChatRole::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("not available"));
    }

    #[tokio::test]
    async fn tool_results_feed_the_second_completion() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        seed_service(&h, "s1", "o1", "Corte", 4500).await;

        h.provider
            .add_response(CompletionResponse {
                text: String::new(),
                tool_calls: vec![
                    call("list_services", json!({})),
                    call("no_such_tool", json!({})),
                ],
            })
            .await;
        h.provider.add_response(CompletionResponse::text("Temos Corte por R$ 45,00.")).await;

        let reply = h
            .ctx
            .orchestrator
            .run(AgentTurn {
                text: "quais serviços?".into(),
                scope: client_scope(),
                system_prompt: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "Temos Corte por R$ 45,00.");

        let requests = h.provider.requests().await;
        let results: Vec<&ChatMessage> = requests[1]
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::Tool)
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].content.contains("Corte"));
        assert!(results[1].content.contains("error"));
    }

    #[tokio::test]
    async fn management_prompt_carries_briefing() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        let mut owner = account("o1", "5511900000001", AccountRole::Owner);
        owner.name = Some("Barbearia".into());
        h.storage.upsert_account(&owner).await.unwrap();
        let mut client = account("c1", "5511911111111", AccountRole::Client);
        client.name = Some("Maria".into());
        h.storage.upsert_account(&client).await.unwrap();
        seed_service(&h, "s1", "o1", "Corte", 4500).await;
        seed_appointment(&h, "a1", "o1", "c1", "2025-06-02", "15:00").await;

        h.provider.add_response(CompletionResponse::text("Você tem 1 cliente hoje.")).await;
        let scope = ToolScope {
            role: ToolRole::Owner,
            caller_account_id: Some("o1".into()),
            caller_phone: "5511900000001".into(),
            ..client_scope()
        };
        h.ctx
            .orchestrator
            .run(AgentTurn {
                text: "como está meu dia?".into(),
                scope,
                system_prompt: "Painel".into(),
            })
            .await
            .unwrap();
        let requests = h.provider.requests().await;
        assert!(requests[0].system_prompt.contains("15:00 - Maria (Corte)"));
    }
}
