// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared dependencies of the state machines.

use std::sync::Arc;

use agendo_config::AgendoConfig;
use agendo_core::{Clock, PaymentGateway, ProviderAdapter, StorageAdapter};
use agendo_skill::RoleAllowList;

use crate::intent::IntentLayer;
use crate::ledger::Ledger;
use crate::orchestrator::{GenerationSettings, Orchestrator};
use crate::tools::{ToolDeps, default_registry};

/// Everything a conversation step may touch.
pub struct EngineContext {
    pub config: Arc<AgendoConfig>,
    pub storage: Arc<dyn StorageAdapter>,
    pub provider: Arc<dyn ProviderAdapter>,
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub clock: Arc<dyn Clock>,
    pub ledger: Arc<Ledger>,
    pub orchestrator: Orchestrator,
    pub intents: IntentLayer,
}

impl EngineContext {
    pub fn new(
        config: AgendoConfig,
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Arc::new(Ledger::new(
            storage.clone(),
            clock.clone(),
            config.scheduling.clone(),
        ));
        let registry = default_registry(ToolDeps {
            storage: storage.clone(),
            ledger: ledger.clone(),
        });
        let orchestrator = Orchestrator::new(
            provider.clone(),
            registry,
            RoleAllowList::with_overrides(&config.ai.role_tools),
            storage.clone(),
            clock.clone(),
            GenerationSettings {
                max_tokens: config.provider.max_tokens,
                temperature: config.provider.temperature,
                briefing: config.ai.briefing,
            },
        );
        let intents = IntentLayer::new(provider.clone());
        Self {
            config: Arc::new(config),
            storage,
            provider,
            payments: None,
            clock,
            ledger,
            orchestrator,
            intents,
        }
    }

    /// Attaches a payment link provider used after successful bookings.
    pub fn with_payments(mut self, payments: Arc<dyn PaymentGateway>) -> Self {
        self.payments = Some(payments);
        self
    }

    pub fn today_key(&self) -> String {
        self.clock.today().format("%Y-%m-%d").to_string()
    }
}
