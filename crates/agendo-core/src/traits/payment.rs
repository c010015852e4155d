// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment link provider trait.

use async_trait::async_trait;

use crate::error::AgendoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Account, Appointment, Service};

/// Creates checkout links for freshly booked appointments.
#[async_trait]
pub trait PaymentGateway: PluginAdapter {
    /// Returns a payment URL, or `None` when the tenant has no payments set up.
    async fn create_payment_link(
        &self,
        appointment: &Appointment,
        service: &Service,
        client: &Account,
    ) -> Result<Option<String>, AgendoError>;
}
