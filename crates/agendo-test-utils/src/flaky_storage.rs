// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper that fails chosen operations on demand.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use agendo_core::{
    Account, AdapterType, AgendoError, Appointment, AppointmentFilter, AppointmentStatus,
    BotPersona, HealthStatus, PaymentStatus, PluginAdapter, Service, Session, StorageAdapter,
    WorkingHours,
};

struct Fault {
    op: &'static str,
    key: Option<String>,
    remaining: Option<usize>,
}

/// Delegates every call to an inner adapter unless a matching fault is armed.
///
/// A fault names the trait method (`"get_account"`) and optionally the first
/// argument it must match (an id, an address). Faults stay armed until
/// [`FlakyStorage::heal`] unless created with [`FlakyStorage::fail_once`].
pub struct FlakyStorage {
    inner: Arc<dyn StorageAdapter>,
    faults: Mutex<Vec<Fault>>,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call of `op` whose key matches.
    pub fn fail(&self, op: &'static str, key: Option<&str>) {
        self.arm(op, key, None);
    }

    /// Fail the next matching call of `op` only.
    pub fn fail_once(&self, op: &'static str, key: Option<&str>) {
        self.arm(op, key, Some(1));
    }

    pub fn heal(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    fn arm(&self, op: &'static str, key: Option<&str>, remaining: Option<usize>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(Fault {
                op,
                key: key.map(str::to_string),
                remaining,
            });
        }
    }

    fn check(&self, op: &'static str, key: Option<&str>) -> Result<(), AgendoError> {
        let Ok(mut faults) = self.faults.lock() else {
            return Ok(());
        };
        let hit = faults.iter().position(|f| {
            f.op == op && f.remaining != Some(0) && (f.key.is_none() || f.key.as_deref() == key)
        });
        let Some(idx) = hit else {
            return Ok(());
        };
        if let Some(remaining) = faults[idx].remaining.as_mut() {
            *remaining -= 1;
        }
        Err(AgendoError::storage(format!("injected {op} failure")))
    }
}

#[async_trait]
impl PluginAdapter for FlakyStorage {
    fn name(&self) -> &str {
        "flaky-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AgendoError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), AgendoError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FlakyStorage {
    async fn initialize(&self) -> Result<(), AgendoError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), AgendoError> {
        self.inner.close().await
    }

    async fn find_account_by_phone(&self, phone: &str) -> Result<Option<Account>, AgendoError> {
        self.check("find_account_by_phone", Some(phone))?;
        self.inner.find_account_by_phone(phone).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AgendoError> {
        self.check("find_account_by_email", Some(email))?;
        self.inner.find_account_by_email(email).await
    }

    async fn get_account(&self, id: &str) -> Result<Option<Account>, AgendoError> {
        self.check("get_account", Some(id))?;
        self.inner.get_account(id).await
    }

    async fn upsert_account(&self, account: &Account) -> Result<(), AgendoError> {
        self.check("upsert_account", Some(&account.id))?;
        self.inner.upsert_account(account).await
    }

    async fn list_tenants(&self) -> Result<Vec<Account>, AgendoError> {
        self.check("list_tenants", None)?;
        self.inner.list_tenants().await
    }

    async fn list_staff(&self, tenant_id: &str) -> Result<Vec<Account>, AgendoError> {
        self.check("list_staff", Some(tenant_id))?;
        self.inner.list_staff(tenant_id).await
    }

    async fn update_bot_persona(
        &self,
        account_id: &str,
        bot: &BotPersona,
    ) -> Result<(), AgendoError> {
        self.check("update_bot_persona", Some(account_id))?;
        self.inner.update_bot_persona(account_id, bot).await
    }

    async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AgendoError> {
        self.check("list_services", Some(tenant_id))?;
        self.inner.list_services(tenant_id).await
    }

    async fn get_service(&self, id: &str) -> Result<Option<Service>, AgendoError> {
        self.check("get_service", Some(id))?;
        self.inner.get_service(id).await
    }

    async fn insert_services(&self, services: &[Service]) -> Result<(), AgendoError> {
        self.check("insert_services", None)?;
        self.inner.insert_services(services).await
    }

    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, AgendoError> {
        self.check("list_appointments", None)?;
        self.inner.list_appointments(filter).await
    }

    async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, AgendoError> {
        self.check("get_appointment", Some(id))?;
        self.inner.get_appointment(id).await
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AgendoError> {
        self.check("insert_appointment", Some(&appointment.id))?;
        self.inner.insert_appointment(appointment).await
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        cancel_reason: Option<&str>,
    ) -> Result<(), AgendoError> {
        self.check("update_appointment_status", Some(id))?;
        self.inner
            .update_appointment_status(id, status, cancel_reason)
            .await
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), AgendoError> {
        self.check("update_payment_status", Some(id))?;
        self.inner.update_payment_status(id, status).await
    }

    async fn update_appointment_slot(
        &self,
        id: &str,
        date: &str,
        time: &str,
    ) -> Result<(), AgendoError> {
        self.check("update_appointment_slot", Some(id))?;
        self.inner.update_appointment_slot(id, date, time).await
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), AgendoError> {
        self.check("delete_appointment", Some(id))?;
        self.inner.delete_appointment(id).await
    }

    async fn batch_insert_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<usize, AgendoError> {
        self.check("batch_insert_appointments", None)?;
        self.inner.batch_insert_appointments(appointments).await
    }

    async fn get_session(&self, address: &str) -> Result<Option<Session>, AgendoError> {
        self.check("get_session", Some(address))?;
        self.inner.get_session(address).await
    }

    async fn put_session(&self, session: &Session) -> Result<(), AgendoError> {
        self.check("put_session", Some(&session.address))?;
        self.inner.put_session(session).await
    }

    async fn delete_session(&self, address: &str) -> Result<(), AgendoError> {
        self.check("delete_session", Some(address))?;
        self.inner.delete_session(address).await
    }

    async fn get_availability(
        &self,
        tenant_id: &str,
    ) -> Result<Option<WorkingHours>, AgendoError> {
        self.check("get_availability", Some(tenant_id))?;
        self.inner.get_availability(tenant_id).await
    }

    async fn set_availability(
        &self,
        tenant_id: &str,
        hours: &WorkingHours,
    ) -> Result<(), AgendoError> {
        self.check("set_availability", Some(tenant_id))?;
        self.inner.set_availability(tenant_id, hours).await
    }
}
