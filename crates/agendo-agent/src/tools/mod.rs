// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling tools exposed to the model.
//!
//! Every tool runs inside the caller's [`ToolScope`](agendo_skill::ToolScope):
//! client tools act on the caller's own bookings, management tools only touch
//! calendars in the caller's roster.

pub mod booking;
pub mod management;
pub mod tenancy;

use std::sync::Arc;

use agendo_core::{AgendoError, Appointment, Service, StorageAdapter};
use agendo_skill::{ToolRegistry, ToolScope};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::ledger::{Ledger, normalize_time, parse_date};

/// Shared handles every tool needs.
#[derive(Clone)]
pub struct ToolDeps {
    pub storage: Arc<dyn StorageAdapter>,
    pub ledger: Arc<Ledger>,
}

/// Registers the full scheduling catalog.
pub fn default_registry(deps: ToolDeps) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(booking::ListServices(deps.clone())));
    registry.register(Arc::new(booking::CheckAvailability(deps.clone())));
    registry.register(Arc::new(booking::ListMyAppointments(deps.clone())));
    registry.register(Arc::new(booking::CreateAppointment(deps.clone())));
    registry.register(Arc::new(booking::CancelMyAppointment(deps.clone())));
    registry.register(Arc::new(booking::RescheduleMyAppointment(deps.clone())));
    registry.register(Arc::new(management::ListAgenda(deps.clone())));
    registry.register(Arc::new(management::ConfirmAppointment(deps.clone())));
    registry.register(Arc::new(management::MarkPaid(deps.clone())));
    registry.register(Arc::new(management::CancelAppointment(deps.clone())));
    registry.register(Arc::new(management::BlockSlot(deps.clone())));
    registry.register(Arc::new(management::RevenueSummary(deps.clone())));
    registry.register(Arc::new(tenancy::ListStaff(deps.clone())));
    registry.register(Arc::new(tenancy::AddStaff(deps.clone())));
    registry.register(Arc::new(tenancy::SubscriptionStatus(deps.clone())));
    registry.register(Arc::new(tenancy::ListTenants(deps)));
    registry
}

/// Deserializes tool arguments, naming the tool on failure.
pub(crate) fn args<T: DeserializeOwned>(tool: &str, input: serde_json::Value) -> Result<T, AgendoError> {
    let input = if input.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        input
    };
    serde_json::from_value(input).map_err(|e| tool_error(tool, format!("invalid arguments: {e}")))
}

pub(crate) fn tool_error(tool: &str, message: impl Into<String>) -> AgendoError {
    AgendoError::Tool {
        name: tool.to_string(),
        message: message.into(),
    }
}

pub(crate) fn date_arg(tool: &str, raw: &str, today: NaiveDate) -> Result<NaiveDate, AgendoError> {
    parse_date(raw, today).ok_or_else(|| tool_error(tool, format!("invalid date: {raw}")))
}

pub(crate) fn time_arg(tool: &str, raw: &str) -> Result<String, AgendoError> {
    normalize_time(raw).ok_or_else(|| tool_error(tool, format!("invalid time: {raw}")))
}

/// Calendar a tool operates on: an explicit visible professional, else the
/// scope's own calendar, else the tenant.
pub(crate) fn professional_for(
    tool: &str,
    scope: &ToolScope,
    requested: Option<&str>,
) -> Result<String, AgendoError> {
    if let Some(id) = requested {
        if scope.can_see(id) {
            return Ok(id.to_string());
        }
        return Err(tool_error(tool, format!("professional {id} is outside your scope")));
    }
    scope
        .calendar_id
        .clone()
        .or_else(|| scope.tenant_id.clone())
        .ok_or_else(|| tool_error(tool, "no establishment selected"))
}

/// Services a professional offers; staff without their own list inherit the
/// tenant's.
pub async fn services_offered(
    storage: &dyn StorageAdapter,
    professional_id: &str,
    tenant_id: Option<&str>,
) -> Result<Vec<Service>, AgendoError> {
    let own = storage.list_services(professional_id).await?;
    match tenant_id {
        Some(tenant) if own.is_empty() && tenant != professional_id => {
            storage.list_services(tenant).await
        }
        _ => Ok(own),
    }
}

/// Loads an appointment a manager may act on.
pub(crate) async fn managed_appointment(
    tool: &str,
    storage: &dyn StorageAdapter,
    scope: &ToolScope,
    id: &str,
) -> Result<Appointment, AgendoError> {
    match storage.get_appointment(id).await? {
        Some(a) if scope.can_see(&a.tenant_id) && a.is_active_booking() => Ok(a),
        _ => Err(tool_error(tool, format!("appointment {id} not found"))),
    }
}
