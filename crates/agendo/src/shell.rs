// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `agendo shell` command implementation.
//!
//! Launches an interactive REPL that speaks to the dialogue engine as one
//! phone number. Outbound messages are printed instead of delivered; texts
//! for other addresses (notifications) are shown with their recipient.

use std::sync::Arc;

use agendo_agent::{DialogueEngine, EngineContext};
use agendo_config::AgendoConfig;
use agendo_core::text::normalize_phone;
use agendo_core::{
    AdapterType, AgendoError, ChannelAdapter, HealthStatus, InboundMessage, MessageId,
    OutboundMessage, PluginAdapter, StorageAdapter, SystemClock,
};
use agendo_openai::OpenAiProvider;
use agendo_storage::SqliteStorage;
use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Who the shell user is speaking as.
#[derive(Debug, Clone)]
pub struct ShellIdentity {
    pub address: String,
    pub tenant: Option<String>,
    pub self_channel: bool,
}

/// Prints outbound messages to the terminal.
struct TerminalChannel {
    address: String,
}

#[async_trait]
impl PluginAdapter for TerminalChannel {
    fn name(&self) -> &str {
        "terminal"
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
impl ChannelAdapter for TerminalChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgendoError> {
        if msg.address == self.address {
            println!("{}\n", msg.text);
        } else {
            println!("{}", format!("-> {}", msg.address).dimmed());
            println!("{}\n", msg.text.dimmed());
        }
        Ok(MessageId(format!("terminal-{}", msg.address)))
    }
}

pub async fn run_shell(config: AgendoConfig, identity: ShellIdentity) -> Result<(), AgendoError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let provider = Arc::new(OpenAiProvider::new(&config).inspect_err(|_| {
        eprintln!("error: OpenAI API key required. Set provider.api_key or OPENAI_API_KEY");
    })?);
    let clock = Arc::new(SystemClock::new(config.scheduling.utc_offset_minutes));
    let channel = Arc::new(TerminalChannel {
        address: normalize_phone(&identity.address),
    });

    let ctx = EngineContext::new(config, storage.clone(), provider, clock);
    let engine = DialogueEngine::new(Arc::new(ctx), channel);

    let mut rl = DefaultEditor::new()
        .map_err(|e| AgendoError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "agendo shell".bold().green());
    println!(
        "Speaking as {}. Type {} to exit.\n",
        identity.address.cyan(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", identity.address.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                let mut msg = InboundMessage::new(identity.address.clone(), trimmed);
                if let Some(tenant) = &identity.tenant {
                    msg = msg.with_tenant_hint(tenant.clone());
                }
                if identity.self_channel {
                    msg = msg.from_self_channel();
                }
                engine.on_inbound_message(msg).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    storage.close().await?;
    Ok(())
}
