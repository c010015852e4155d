// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate fixtures for unit tests: temp SQLite, the shared mock provider
//! and a frozen clock.

use std::sync::Arc;

use agendo_config::AgendoConfig;
use agendo_config::model::StorageConfig;
use agendo_core::{
    Account, AccountRole, Appointment, AppointmentStatus, FixedClock, PaymentStatus, Service,
    StorageAdapter,
};
use agendo_storage::SqliteStorage;
use agendo_test_utils::{FlakyStorage, MockProvider};
use tempfile::TempDir;

use crate::context::EngineContext;
use crate::ledger::Ledger;

pub struct Harness {
    pub storage: Arc<dyn StorageAdapter>,
    pub faults: Arc<FlakyStorage>,
    pub ledger: Arc<Ledger>,
    pub ctx: Arc<EngineContext>,
    pub provider: Arc<MockProvider>,
    pub clock: Arc<FixedClock>,
    _dir: TempDir,
}

/// Engine context over a fresh database with the clock frozen at `now`.
pub async fn harness(now: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("agendo.db").display().to_string(),
        wal_mode: true,
    });
    storage.initialize().await.unwrap();
    let faults = Arc::new(FlakyStorage::new(Arc::new(storage)));
    let storage: Arc<dyn StorageAdapter> = faults.clone();
    let provider = Arc::new(MockProvider::new());
    let clock = Arc::new(FixedClock::at(now).unwrap());
    let ctx = Arc::new(EngineContext::new(
        AgendoConfig::default(),
        storage.clone(),
        provider.clone(),
        clock.clone(),
    ));
    Harness {
        storage,
        faults,
        ledger: ctx.ledger.clone(),
        ctx,
        provider,
        clock,
        _dir: dir,
    }
}

pub fn account(id: &str, phone: &str, role: AccountRole) -> Account {
    let mut account = Account::guest(id, phone);
    account.role = role;
    account
}

pub async fn seed_service(h: &Harness, id: &str, tenant: &str, name: &str, price_cents: i64) {
    h.storage
        .insert_services(&[Service {
            id: id.into(),
            tenant_id: tenant.into(),
            name: name.into(),
            price_cents,
            duration_minutes: 60,
        }])
        .await
        .unwrap();
}

/// A pending booking for service `s1`.
pub async fn seed_appointment(
    h: &Harness,
    id: &str,
    tenant: &str,
    client: &str,
    date: &str,
    time: &str,
) {
    h.storage
        .insert_appointment(&Appointment {
            id: id.into(),
            tenant_id: tenant.into(),
            client_id: client.into(),
            service_id: "s1".into(),
            date: date.into(),
            time: time.into(),
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: "2025-06-01T09:00:00-03:00".into(),
        })
        .await
        .unwrap();
}
