// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use agendo_config::model::StorageConfig;
use agendo_core::{
    Account, AdapterType, AgendoError, Appointment, AppointmentFilter, AppointmentStatus,
    BotPersona, HealthStatus, PaymentStatus, PluginAdapter, Service, Session, StorageAdapter,
    WorkingHours,
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, AgendoError> {
        self.db
            .get()
            .ok_or_else(|| AgendoError::storage("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AgendoError> {
        self.db()?
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AgendoError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), AgendoError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| AgendoError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), AgendoError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn find_account_by_phone(&self, phone: &str) -> Result<Option<Account>, AgendoError> {
        queries::accounts::find_by_phone(self.db()?, phone).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AgendoError> {
        queries::accounts::find_by_email(self.db()?, email).await
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AgendoError> {
        queries::accounts::get(self.db()?, id).await
    }

    async fn upsert_account(&self, account: &Account) -> Result<(), AgendoError> {
        queries::accounts::upsert(self.db()?, account).await
    }

    async fn list_tenants(&self) -> Result<Vec<Account>, AgendoError> {
        queries::accounts::list_tenants(self.db()?).await
    }

    async fn list_staff(&self, tenant_id: &str) -> Result<Vec<Account>, AgendoError> {
        queries::accounts::list_staff(self.db()?, tenant_id).await
    }

    async fn update_bot_persona(
        &self,
        account_id: &str,
        bot: &BotPersona,
    ) -> Result<(), AgendoError> {
        queries::accounts::update_bot(self.db()?, account_id, bot).await
    }

    async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AgendoError> {
        queries::services::list(self.db()?, tenant_id).await
    }

    async fn get_service(&self, id: &str) -> Result<Option<Service>, AgendoError> {
        queries::services::get(self.db()?, id).await
    }

    async fn insert_services(&self, services: &[Service]) -> Result<(), AgendoError> {
        queries::services::insert_many(self.db()?, services).await
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AgendoError> {
        queries::appointments::list(self.db()?, filter).await
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, AgendoError> {
        queries::appointments::get(self.db()?, id).await
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AgendoError> {
        queries::appointments::insert(self.db()?, appointment).await
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        cancel_reason: Option<&str>,
    ) -> Result<(), AgendoError> {
        queries::appointments::update_status(self.db()?, id, status, cancel_reason).await
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), AgendoError> {
        queries::appointments::update_payment(self.db()?, id, status).await
    }

    async fn update_appointment_slot(
        &self,
        id: &str,
        date: &str,
        time: &str,
    ) -> Result<(), AgendoError> {
        queries::appointments::update_slot(self.db()?, id, date, time).await
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), AgendoError> {
        queries::appointments::delete(self.db()?, id).await
    }

    async fn batch_insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<usize, AgendoError> {
        queries::appointments::batch_insert(self.db()?, appointments).await
    }

    async fn get_session(&self, address: &str) -> Result<Option<Session>, AgendoError> {
        queries::sessions::get(self.db()?, address).await
    }

    async fn put_session(&self, session: &Session) -> Result<(), AgendoError> {
        queries::sessions::put(self.db()?, session).await
    }

    async fn delete_session(&self, address: &str) -> Result<(), AgendoError> {
        queries::sessions::delete(self.db()?, address).await
    }

    async fn get_availability(
        &self,
        tenant_id: &str,
    ) -> Result<Option<WorkingHours>, AgendoError> {
        queries::availability::get(self.db()?, tenant_id).await
    }

    async fn set_availability(
        &self,
        tenant_id: &str,
        hours: &WorkingHours,
    ) -> Result<(), AgendoError> {
        queries::availability::set(self.db()?, tenant_id, hours).await
    }
}
