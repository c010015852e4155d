// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete dialogue engine with mock adapters, a
//! temp SQLite database and a frozen clock. Provides `send()` to drive the
//! full pipeline (identity -> session -> machine -> storage -> channel).

use std::sync::Arc;

use agendo_agent::{DialogueEngine, EngineContext};
use agendo_config::AgendoConfig;
use agendo_config::model::StorageConfig;
use agendo_core::{
    Account, AccountRole, AgendoError, Appointment, AppointmentFilter, AppointmentStatus,
    FixedClock, InboundMessage, OutboundMessage, PaymentStatus, Service, Session, StorageAdapter,
};
use agendo_storage::SqliteStorage;

use crate::flaky_storage::FlakyStorage;
use crate::mock_channel::MockChannel;
use crate::mock_payments::MockPayments;
use crate::mock_provider::MockProvider;

/// Monday 2025-06-02, 09:00 in UTC-3.
pub const DEFAULT_NOW: &str = "2025-06-02T09:00:00-03:00";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: AgendoConfig,
    now: String,
    payments: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: AgendoConfig::default(),
            now: DEFAULT_NOW.to_string(),
            payments: false,
        }
    }

    /// Freeze the clock at an RFC 3339 instant.
    pub fn at(mut self, now: &str) -> Self {
        self.now = now.to_string();
        self
    }

    pub fn with_config(mut self, config: AgendoConfig) -> Self {
        self.config = config;
        self
    }

    /// Adjust the default configuration in place.
    pub fn configure(mut self, f: impl FnOnce(&mut AgendoConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Attach a [`MockPayments`] gateway.
    pub fn with_payments(mut self) -> Self {
        self.payments = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, AgendoError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| AgendoError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let faults = Arc::new(FlakyStorage::new(Arc::new(storage)));
        let storage: Arc<dyn StorageAdapter> = faults.clone();

        let clock = Arc::new(
            FixedClock::at(&self.now)
                .map_err(|e| AgendoError::InvalidInput(format!("bad harness time: {e}")))?,
        );
        let provider = Arc::new(MockProvider::new());
        let channel = Arc::new(MockChannel::new());

        let mut ctx = EngineContext::new(
            self.config,
            storage.clone(),
            provider.clone(),
            clock.clone(),
        );
        let payments = if self.payments {
            let payments = Arc::new(MockPayments::new());
            ctx = ctx.with_payments(payments.clone());
            Some(payments)
        } else {
            None
        };

        let engine = Arc::new(DialogueEngine::new(Arc::new(ctx), channel.clone()));

        Ok(TestHarness {
            engine,
            provider,
            channel,
            payments,
            storage,
            faults,
            clock,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub engine: Arc<DialogueEngine>,
    pub provider: Arc<MockProvider>,
    pub channel: Arc<MockChannel>,
    pub payments: Option<Arc<MockPayments>>,
    pub storage: Arc<dyn StorageAdapter>,
    /// Fault switchboard over `storage`.
    pub faults: Arc<FlakyStorage>,
    pub clock: Arc<FixedClock>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default configuration, clock at [`DEFAULT_NOW`].
    pub async fn new() -> Result<Self, AgendoError> {
        Self::builder().build().await
    }

    /// Drive one inbound message through the engine.
    pub async fn send_message(&self, msg: InboundMessage) -> Vec<OutboundMessage> {
        self.engine.on_inbound_message(msg).await
    }

    pub async fn send(&self, address: &str, text: &str) -> Vec<OutboundMessage> {
        self.send_message(InboundMessage::new(address, text)).await
    }

    /// Sends and returns the texts addressed back to the sender, joined by
    /// blank lines.
    pub async fn reply(&self, address: &str, text: &str) -> String {
        let sent = self.send(address, text).await;
        sent.iter()
            .filter(|m| m.address == address)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub async fn session(&self, address: &str) -> Result<Option<Session>, AgendoError> {
        self.engine.session_of(address).await
    }

    // --- Seeding ---

    pub async fn seed_account(
        &self,
        id: &str,
        phone: &str,
        name: Option<&str>,
        role: AccountRole,
        owner_id: Option<&str>,
    ) -> Result<Account, AgendoError> {
        let mut account = Account::guest(id, phone);
        account.role = role;
        account.name = name.map(str::to_string);
        account.owner_id = owner_id.map(str::to_string);
        self.storage.upsert_account(&account).await?;
        Ok(account)
    }

    pub async fn seed_owner(&self, id: &str, phone: &str, name: &str) -> Result<Account, AgendoError> {
        self.seed_account(id, phone, Some(name), AccountRole::Owner, None)
            .await
    }

    pub async fn seed_staff(
        &self,
        id: &str,
        phone: &str,
        name: &str,
        owner_id: &str,
    ) -> Result<Account, AgendoError> {
        self.seed_account(id, phone, Some(name), AccountRole::Staff, Some(owner_id))
            .await
    }

    pub async fn seed_client(&self, id: &str, phone: &str, name: &str) -> Result<Account, AgendoError> {
        self.seed_account(id, phone, Some(name), AccountRole::Client, None)
            .await
    }

    /// A one-hour service.
    pub async fn seed_service(
        &self,
        id: &str,
        tenant_id: &str,
        name: &str,
        price_cents: i64,
    ) -> Result<Service, AgendoError> {
        let service = Service {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            price_cents,
            duration_minutes: 60,
        };
        self.storage
            .insert_services(std::slice::from_ref(&service))
            .await?;
        Ok(service)
    }

    /// A pending, unpaid booking.
    pub async fn seed_appointment(
        &self,
        id: &str,
        tenant_id: &str,
        client_id: &str,
        service_id: &str,
        date: &str,
        time: &str,
    ) -> Result<Appointment, AgendoError> {
        let appointment = Appointment {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            service_id: service_id.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.storage.insert_appointment(&appointment).await?;
        Ok(appointment)
    }

    /// Every appointment row of a tenant, blocked and cancelled included.
    pub async fn appointments(&self, tenant_id: &str) -> Result<Vec<Appointment>, AgendoError> {
        self.storage
            .list_appointments(&AppointmentFilter {
                tenant_ids: vec![tenant_id.to_string()],
                ..AppointmentFilter::default()
            })
            .await
    }
}
