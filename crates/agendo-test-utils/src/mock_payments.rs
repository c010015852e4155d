// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment gateway returning `https://pay.test/{appointment_id}`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use agendo_core::{
    Account, AdapterType, AgendoError, Appointment, HealthStatus, PaymentGateway, PluginAdapter,
    Service,
};

pub struct MockPayments {
    links: Arc<Mutex<Vec<String>>>,
    failing: AtomicBool,
}

impl MockPayments {
    pub fn new() -> Self {
        Self {
            links: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Links handed out so far.
    pub async fn links(&self) -> Vec<String> {
        self.links.lock().await.clone()
    }

    pub fn fail_links(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for MockPayments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPayments {
    fn name(&self) -> &str {
        "mock-payments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, AgendoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AgendoError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockPayments {
    async fn create_payment_link(
        &self,
        appointment: &Appointment,
        _service: &Service,
        _client: &Account,
    ) -> Result<Option<String>, AgendoError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AgendoError::Internal("mock payment provider down".into()));
        }
        let link = format!("https://pay.test/{}", appointment.id);
        self.links.lock().await.push(link.clone());
        Ok(Some(link))
    }
}
