// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `agendo serve` command implementation.
//!
//! Wires SQLite storage, the OpenAI provider and the HTTP bridge channel into
//! a [`DialogueEngine`], starts the webhook gateway and runs one task per
//! inbound message until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use agendo_agent::shutdown;
use agendo_agent::{DialogueEngine, EngineContext};
use agendo_config::AgendoConfig;
use agendo_core::{AgendoError, ChannelAdapter, StorageAdapter, SystemClock};
use agendo_gateway::{GatewayState, HttpChannel, HttpChannelConfig, ServerConfig, start_server};
use agendo_openai::OpenAiProvider;
use agendo_storage::SqliteStorage;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Inbound messages buffered between the webhook and the engine.
const INBOUND_QUEUE: usize = 256;

const BRIDGE_TIMEOUT: Duration = Duration::from_secs(30);

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_serve(config: AgendoConfig) -> Result<(), AgendoError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = config.storage.database_path.as_str(), "storage initialized");

    let provider = Arc::new(OpenAiProvider::new(&config).inspect_err(|_| {
        eprintln!("error: OpenAI API key required. Set provider.api_key or OPENAI_API_KEY");
    })?);

    let channel: Arc<dyn ChannelAdapter> = Arc::new(HttpChannel::new(&HttpChannelConfig {
        bridge_url: config.gateway.bridge_url.clone(),
        bridge_token: config.gateway.bridge_token.clone(),
        timeout: BRIDGE_TIMEOUT,
    })?);

    let clock = Arc::new(SystemClock::new(config.scheduling.utc_offset_minutes));
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let bearer_token = config.gateway.bearer_token.clone();
    if bearer_token.is_none() {
        warn!("gateway.bearer_token not set, inbound webhook is unauthenticated");
    }

    let ctx = EngineContext::new(config, storage.clone(), provider, clock);
    let engine = Arc::new(DialogueEngine::new(Arc::new(ctx), channel));

    let cancel = shutdown::install_signal_handler();
    let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_QUEUE);
    let state = GatewayState::new(inbound_tx, bearer_token);

    let server_cancel = cancel.clone();
    let mut server =
        tokio::spawn(async move { start_server(&server_config, state, server_cancel).await });
    let mut server_running = true;

    let tracker = TaskTracker::new();
    let mut outcome = Ok(());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            joined = &mut server, if server_running => {
                server_running = false;
                outcome = match joined {
                    Ok(result) => result,
                    Err(e) => Err(AgendoError::Internal(format!("gateway task failed: {e}"))),
                };
                if let Err(e) = &outcome {
                    error!(error = %e, "gateway stopped unexpectedly");
                }
                cancel.cancel();
                break;
            }
            received = inbound_rx.recv() => {
                let Some(msg) = received else { break };
                let engine = engine.clone();
                tracker.spawn(async move {
                    engine.on_inbound_message(msg).await;
                });
            }
        }
    }

    info!("shutting down");
    shutdown::drain_turns(&tracker, DRAIN_TIMEOUT).await;

    if server_running {
        match server.await {
            Ok(Err(e)) => warn!(error = %e, "gateway shutdown error"),
            Err(e) => warn!(error = %e, "gateway task failed during shutdown"),
            Ok(Ok(())) => {}
        }
    }

    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }
    info!("agendo stopped");
    outcome
}
