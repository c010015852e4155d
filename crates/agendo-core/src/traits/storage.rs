// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::AgendoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Account, Appointment, AppointmentFilter, AppointmentStatus, BotPersona, PaymentStatus,
    Service, Session, WorkingHours,
};

/// Adapter for storage and persistence backends.
///
/// Holds accounts, services, the appointment ledger, dialogue sessions and
/// working-hours templates.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), AgendoError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), AgendoError>;

    // --- Accounts ---

    /// Finds the account whose phone shares the last 8 digits with `phone`.
    ///
    /// When several match, management roles are returned first.
    async fn find_account_by_phone(&self, phone: &str) -> Result<Option<Account>, AgendoError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AgendoError>;

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AgendoError>;

    /// Inserts or replaces an account by id.
    async fn upsert_account(&self, account: &Account) -> Result<(), AgendoError>;

    /// All owner accounts.
    async fn list_tenants(&self) -> Result<Vec<Account>, AgendoError>;

    /// Staff accounts whose `owner_id` is `tenant_id`.
    async fn list_staff(&self, tenant_id: &str) -> Result<Vec<Account>, AgendoError>;

    async fn update_bot_persona(
        &self,
        account_id: &str,
        bot: &BotPersona,
    ) -> Result<(), AgendoError>;

    // --- Services ---

    async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AgendoError>;

    async fn get_service(&self, id: &str) -> Result<Option<Service>, AgendoError>;

    async fn insert_services(&self, services: &[Service]) -> Result<(), AgendoError>;

    // --- Appointments ---

    /// Lists appointments ordered by date then time.
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AgendoError>;

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, AgendoError>;

    /// Inserts an appointment.
    ///
    /// Fails with [`AgendoError::SlotTaken`] when a non-cancelled row already
    /// holds the slot.
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AgendoError>;

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        cancel_reason: Option<&str>,
    ) -> Result<(), AgendoError>;

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), AgendoError>;

    /// Moves an appointment to another slot, subject to the same conflict rule
    /// as [`insert_appointment`](Self::insert_appointment).
    async fn update_appointment_slot(
        &self,
        id: &str,
        date: &str,
        time: &str,
    ) -> Result<(), AgendoError>;

    async fn delete_appointment(&self, id: &str) -> Result<(), AgendoError>;

    /// Inserts all rows in one transaction, skipping rows whose id already
    /// exists or whose slot is taken. Returns the number of rows inserted.
    async fn batch_insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<usize, AgendoError>;

    // --- Sessions ---

    async fn get_session(&self, address: &str) -> Result<Option<Session>, AgendoError>;

    /// Creates or replaces the session for its address.
    async fn put_session(&self, session: &Session) -> Result<(), AgendoError>;

    async fn delete_session(&self, address: &str) -> Result<(), AgendoError>;

    // --- Working hours ---

    async fn get_availability(&self, tenant_id: &str)
    -> Result<Option<WorkingHours>, AgendoError>;

    async fn set_availability(
        &self,
        tenant_id: &str,
        hours: &WorkingHours,
    ) -> Result<(), AgendoError>;
}
