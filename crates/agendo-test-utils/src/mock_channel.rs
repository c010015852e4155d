// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter capturing outbound messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use agendo_core::{
    AdapterType, AgendoError, ChannelAdapter, HealthStatus, MessageId, OutboundMessage,
    PluginAdapter,
};

/// A mock messaging channel for testing.
///
/// Messages passed to `send()` are captured and retrievable via
/// `sent_messages()`. With `fail_sends(true)` every delivery errors.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failing: AtomicBool,
    next_delay: std::sync::Mutex<Option<Duration>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
            next_delay: std::sync::Mutex::new(None),
        }
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages delivered to one address.
    pub async fn sent_to(&self, address: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.address == address)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Holds the next delivery for `delay` before capturing it.
    pub fn slow_next_send(&self, delay: Duration) {
        if let Ok(mut next) = self.next_delay.lock() {
            *next = Some(delay);
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
impl ChannelAdapter for MockChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, AgendoError> {
        let delay = self.next_delay.lock().ok().and_then(|mut next| next.take());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AgendoError::Channel {
                message: format!("mock delivery to {} failed", msg.address),
                source: None,
            });
        }
        let mut sent = self.sent.lock().await;
        sent.push(msg);
        Ok(MessageId(format!("mock-msg-{}", sent.len())))
    }
}
