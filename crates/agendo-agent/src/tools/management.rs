// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agenda tools for staff and owners.

use agendo_core::{AgendoError, AppointmentStatus, PaymentStatus};
use agendo_skill::{Tool, ToolOutput, ToolScope};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::{ToolDeps, args, date_arg, managed_appointment, professional_for, time_arg};
use crate::agenda::{agenda_for, revenue_for};
use crate::templates::format_brl;

#[derive(Deserialize)]
struct DateArgs {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct AppointmentArgs {
    appointment_id: String,
}

fn appointment_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "appointment_id": { "type": "string" } },
        "required": ["appointment_id"]
    })
}

fn optional_date_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "date": { "type": "string", "description": "YYYY-MM-DD, default today" } }
    })
}

pub struct ListAgenda(pub ToolDeps);

#[async_trait]
impl Tool for ListAgenda {
    fn name(&self) -> &str {
        "list_agenda"
    }

    fn description(&self) -> &str {
        "List the appointments of the roster for a date"
    }

    fn parameters_schema(&self) -> Value {
        optional_date_schema()
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        let a: DateArgs = args(self.name(), input)?;
        let today = self.0.ledger.today();
        let date = match a.date.as_deref() {
            Some(raw) => date_arg(self.name(), raw, today)?,
            None => today,
        };
        let key = date.format("%Y-%m-%d").to_string();
        let entries = agenda_for(self.0.storage.as_ref(), &scope.roster, &key).await?;
        let rows: Vec<Value> = entries
            .into_iter()
            .map(|e| {
                json!({
                    "appointment_id": e.appointment.id,
                    "time": e.appointment.time,
                    "client": e.client_name,
                    "service": e.service_name,
                    "professional": e.professional_name,
                    "status": e.appointment.status,
                    "payment_status": e.appointment.payment_status,
                })
            })
            .collect();
        ToolOutput::json(&json!({ "date": key, "appointments": rows }))
    }
}

pub struct ConfirmAppointment(pub ToolDeps);

#[async_trait]
impl Tool for ConfirmAppointment {
    fn name(&self) -> &str {
        "confirm_appointment"
    }

    fn description(&self) -> &str {
        "Mark an appointment as confirmed"
    }

    fn parameters_schema(&self) -> Value {
        appointment_schema()
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        let a: AppointmentArgs = args(self.name(), input)?;
        let storage = self.0.storage.as_ref();
        let appointment = managed_appointment(self.name(), storage, scope, &a.appointment_id).await?;
        storage
            .update_appointment_status(&appointment.id, AppointmentStatus::Confirmed, None)
            .await?;
        ToolOutput::json(&json!({ "appointment_id": appointment.id, "status": "confirmed" }))
    }
}

pub struct MarkPaid(pub ToolDeps);

#[async_trait]
impl Tool for MarkPaid {
    fn name(&self) -> &str {
        "mark_paid"
    }

    fn description(&self) -> &str {
        "Record that an appointment has been paid"
    }

    fn parameters_schema(&self) -> Value {
        appointment_schema()
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        let a: AppointmentArgs = args(self.name(), input)?;
        let storage = self.0.storage.as_ref();
        let appointment = managed_appointment(self.name(), storage, scope, &a.appointment_id).await?;
        storage
            .update_payment_status(&appointment.id, PaymentStatus::Paid)
            .await?;
        ToolOutput::json(&json!({ "appointment_id": appointment.id, "payment_status": "paid" }))
    }
}

pub struct CancelAppointment(pub ToolDeps);

#[async_trait]
impl Tool for CancelAppointment {
    fn name(&self) -> &str {
        "cancel_appointment"
    }

    fn description(&self) -> &str {
        "Cancel a client's appointment with an optional reason"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "appointment_id": { "type": "string" },
                "reason": { "type": "string" }
            },
            "required": ["appointment_id"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            appointment_id: String,
            #[serde(default)]
            reason: Option<String>,
        }
        let a: Args = args(self.name(), input)?;
        let storage = self.0.storage.as_ref();
        let appointment = managed_appointment(self.name(), storage, scope, &a.appointment_id).await?;
        let reason = a.reason.as_deref().unwrap_or("imprevisto na agenda");
        storage
            .update_appointment_status(&appointment.id, AppointmentStatus::Cancelled, Some(reason))
            .await?;
        ToolOutput::json(&json!({ "appointment_id": appointment.id, "status": "cancelled" }))
    }
}

pub struct BlockSlot(pub ToolDeps);

#[async_trait]
impl Tool for BlockSlot {
    fn name(&self) -> &str {
        "block_slot"
    }

    fn description(&self) -> &str {
        "Block one time or, without time, every free slot of a date on the caller's calendar"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "YYYY-MM-DD" },
                "time": { "type": "string", "description": "HH:MM" }
            },
            "required": ["date"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            date: String,
            #[serde(default)]
            time: Option<String>,
        }
        let a: Args = args(self.name(), input)?;
        let date = date_arg(self.name(), &a.date, self.0.ledger.today())?;
        let time = a.time.as_deref().map(|t| time_arg(self.name(), t)).transpose()?;
        let calendar = professional_for(self.name(), scope, None)?;
        let blocked = self.0.ledger.block(&calendar, date, time.as_deref()).await?;
        info!(tenant_id = %calendar, blocked, "block_slot tool applied");
        ToolOutput::json(&json!({ "date": date.format("%Y-%m-%d").to_string(), "blocked": blocked }))
    }
}

pub struct RevenueSummary(pub ToolDeps);

#[async_trait]
impl Tool for RevenueSummary {
    fn name(&self) -> &str {
        "revenue_summary"
    }

    fn description(&self) -> &str {
        "Count and total of paid appointments for a date"
    }

    fn parameters_schema(&self) -> Value {
        optional_date_schema()
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        let a: DateArgs = args(self.name(), input)?;
        let today = self.0.ledger.today();
        let date = match a.date.as_deref() {
            Some(raw) => date_arg(self.name(), raw, today)?,
            None => today,
        };
        let key = date.format("%Y-%m-%d").to_string();
        let revenue = revenue_for(self.0.storage.as_ref(), &scope.roster, &key).await?;
        ToolOutput::json(&json!({
            "date": key,
            "paid_count": revenue.count,
            "total_cents": revenue.total_cents,
            "total": format_brl(revenue.total_cents),
        }))
    }
}
