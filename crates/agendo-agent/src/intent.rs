// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language command classification for managers.
//!
//! The model is asked for a single JSON object tagged by `intent`. Anything
//! that does not parse into [`Intent`] is reported as a provider error so the
//! caller can apologize and keep the conversation state.

use std::sync::Arc;

use agendo_core::{AgendoError, ChatMessage, CompletionRequest, ProviderAdapter};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

/// A management command extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    ShowAgenda {
        #[serde(default)]
        date: Option<String>,
    },
    CancelNext {
        #[serde(default, deserialize_with = "lenient_count")]
        count: Option<u32>,
        #[serde(default)]
        reason: Option<String>,
    },
    CancelAppointment {
        #[serde(default)]
        client_name: Option<String>,
        #[serde(default)]
        time: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    ConfirmAppointment {
        #[serde(default)]
        client_name: Option<String>,
        #[serde(default)]
        time: Option<String>,
    },
    MarkPaid {
        #[serde(default)]
        client_name: Option<String>,
        #[serde(default)]
        time: Option<String>,
    },
    BlockDay {
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        time: Option<String>,
    },
    None,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::ShowAgenda { .. } => "show_agenda",
            Intent::CancelNext { .. } => "cancel_next",
            Intent::CancelAppointment { .. } => "cancel_appointment",
            Intent::ConfirmAppointment { .. } => "confirm_appointment",
            Intent::MarkPaid { .. } => "mark_paid",
            Intent::BlockDay { .. } => "block_day",
            Intent::None => "none",
        }
    }
}

/// Accepts `2`, `"2"` or `null`.
fn lenient_count<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }
    Ok(match Option::<Count>::deserialize(de)? {
        Some(Count::Number(n)) => Some(n),
        Some(Count::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

const INTENT_PROMPT: &str = r#"Você classifica comandos de um gestor de agenda. Responda APENAS com um objeto JSON, sem texto extra.
Formatos aceitos:
{"intent":"show_agenda","date":"YYYY-MM-DD"}
{"intent":"cancel_next","count":1,"reason":"motivo"}
{"intent":"cancel_appointment","client_name":"nome","time":"HH:MM","reason":"motivo"}
{"intent":"confirm_appointment","client_name":"nome","time":"HH:MM"}
{"intent":"mark_paid","client_name":"nome","time":"HH:MM"}
{"intent":"block_day","date":"YYYY-MM-DD","time":"HH:MM"}
{"intent":"none"}
Campos desconhecidos podem ser omitidos. Use "none" para conversa ou perguntas."#;

/// Extracts the outermost JSON object from a model reply, tolerating code
/// fences and surrounding prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Classifies manager messages with the LLM.
pub struct IntentLayer {
    provider: Arc<dyn ProviderAdapter>,
}

impl IntentLayer {
    pub fn new(provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { provider }
    }

    /// Detects the intent of `text`; `hint` names the action the manager
    /// picked from the menu, if any.
    pub async fn detect(
        &self,
        text: &str,
        hint: Option<&str>,
        today: NaiveDate,
    ) -> Result<Intent, AgendoError> {
        let mut system_prompt = format!("{INTENT_PROMPT}\nHoje é {}.", today.format("%Y-%m-%d"));
        if let Some(hint) = hint {
            system_prompt.push_str(&format!("\nO gestor escolheu a ação: {hint}."));
        }
        let request = CompletionRequest {
            system_prompt,
            messages: vec![ChatMessage::user(text)],
            tools: None,
            max_tokens: Some(256),
            temperature: Some(0.0),
        };
        let response = self.provider.complete(request).await?;
        let Some(raw) = extract_json_object(&response.text) else {
            warn!(reply_len = response.text.len(), "intent reply contained no JSON object");
            return Err(AgendoError::provider("intent reply contained no JSON object"));
        };
        let intent: Intent = serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "malformed intent JSON");
            AgendoError::Provider {
                message: "malformed intent JSON".to_string(),
                source: Some(Box::new(e)),
            }
        })?;
        debug!(intent = intent.name(), "intent detected");
        Ok(intent)
    }
}
