// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog and client self-service tools.

use agendo_core::text::phone_suffix;
use agendo_core::{AgendoError, Appointment, AppointmentStatus, PaymentStatus};
use agendo_skill::{Tool, ToolOutput, ToolScope};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolDeps, args, date_arg, professional_for, services_offered, time_arg, tool_error};
use crate::agenda::{caller_bookings, with_names};
use crate::templates::format_brl;

pub struct ListServices(pub ToolDeps);

#[async_trait]
impl Tool for ListServices {
    fn name(&self) -> &str {
        "list_services"
    }

    fn description(&self) -> &str {
        "List the services offered, with price and duration"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "professional_id": { "type": "string", "description": "Optional professional id" }
            }
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            professional_id: Option<String>,
        }
        let a: Args = args(self.name(), input)?;
        let professional = professional_for(self.name(), scope, a.professional_id.as_deref())?;
        let services =
            services_offered(self.0.storage.as_ref(), &professional, scope.tenant_id.as_deref())
                .await?;
        let rows: Vec<Value> = services
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "price": format_brl(s.price_cents),
                    "price_cents": s.price_cents,
                    "duration_minutes": s.duration_minutes,
                })
            })
            .collect();
        ToolOutput::json(&rows)
    }
}

pub struct CheckAvailability(pub ToolDeps);

#[async_trait]
impl Tool for CheckAvailability {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "List the free start times for a date (YYYY-MM-DD)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "Date as YYYY-MM-DD" },
                "professional_id": { "type": "string", "description": "Optional professional id" }
            },
            "required": ["date"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            date: String,
            #[serde(default)]
            professional_id: Option<String>,
        }
        let a: Args = args(self.name(), input)?;
        let date = date_arg(self.name(), &a.date, self.0.ledger.today())?;
        let professional = professional_for(self.name(), scope, a.professional_id.as_deref())?;
        let free = self.0.ledger.free_slots(&professional, date).await?;
        ToolOutput::json(&json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "professional_id": professional,
            "free_times": free,
        }))
    }
}

pub struct ListMyAppointments(pub ToolDeps);

#[async_trait]
impl Tool for ListMyAppointments {
    fn name(&self) -> &str {
        "list_my_appointments"
    }

    fn description(&self) -> &str {
        "List the caller's upcoming appointments"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, scope: &ToolScope, _input: Value) -> Result<ToolOutput, AgendoError> {
        let storage = self.0.storage.as_ref();
        let bookings = caller_bookings(storage, &scope.caller_phone, self.0.ledger.today()).await?;
        let rows: Vec<Value> = with_names(storage, bookings)
            .await?
            .into_iter()
            .map(|e| {
                json!({
                    "appointment_id": e.appointment.id,
                    "date": e.appointment.date,
                    "time": e.appointment.time,
                    "service": e.service_name,
                    "professional": e.professional_name,
                    "status": e.appointment.status,
                })
            })
            .collect();
        ToolOutput::json(&rows)
    }
}

/// Loads an appointment that belongs to the caller.
async fn own_appointment(
    deps: &ToolDeps,
    tool: &str,
    scope: &ToolScope,
    id: &str,
) -> Result<Appointment, AgendoError> {
    let not_found = || tool_error(tool, format!("appointment {id} not found"));
    let appointment = deps
        .storage
        .get_appointment(id)
        .await?
        .filter(Appointment::is_active_booking)
        .ok_or_else(not_found)?;
    if scope.caller_account_id.as_deref() == Some(appointment.client_id.as_str()) {
        return Ok(appointment);
    }
    let owner = deps.storage.get_account(&appointment.client_id).await?;
    match owner {
        Some(acc) if phone_suffix(&acc.phone) == phone_suffix(&scope.caller_phone) => {
            Ok(appointment)
        }
        _ => Err(not_found()),
    }
}

/// Checks a slot is free for booking or moving into.
async fn ensure_free(
    deps: &ToolDeps,
    tool: &str,
    professional: &str,
    date: chrono::NaiveDate,
    time: &str,
) -> Result<(), AgendoError> {
    if date < deps.ledger.today() {
        return Err(tool_error(tool, "date is in the past"));
    }
    let free = deps.ledger.free_slots(professional, date).await?;
    if free.iter().any(|t| t == time) {
        Ok(())
    } else {
        Err(tool_error(tool, format!("{time} is not available on {date}")))
    }
}

pub struct CreateAppointment(pub ToolDeps);

#[async_trait]
impl Tool for CreateAppointment {
    fn name(&self) -> &str {
        "create_appointment"
    }

    fn description(&self) -> &str {
        "Book a service for the caller at a free date and time"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "service_id": { "type": "string" },
                "date": { "type": "string", "description": "YYYY-MM-DD" },
                "time": { "type": "string", "description": "HH:MM" },
                "professional_id": { "type": "string" }
            },
            "required": ["service_id", "date", "time"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            service_id: String,
            date: String,
            time: String,
            #[serde(default)]
            professional_id: Option<String>,
        }
        let a: Args = args(self.name(), input)?;
        let Some(client_id) = scope.caller_account_id.clone() else {
            return Ok(ToolOutput::error("caller has no account yet"));
        };
        let professional = professional_for(self.name(), scope, a.professional_id.as_deref())?;
        let date = date_arg(self.name(), &a.date, self.0.ledger.today())?;
        let time = time_arg(self.name(), &a.time)?;

        let offered =
            services_offered(self.0.storage.as_ref(), &professional, scope.tenant_id.as_deref())
                .await?;
        if !offered.iter().any(|s| s.id == a.service_id) {
            return Err(tool_error(self.name(), format!("unknown service {}", a.service_id)));
        }
        ensure_free(&self.0, self.name(), &professional, date, &time).await?;

        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: professional,
            client_id,
            service_id: a.service_id,
            date: date.format("%Y-%m-%d").to_string(),
            time,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.0.ledger.book(&appointment).await?;
        ToolOutput::json(&json!({
            "appointment_id": appointment.id,
            "date": appointment.date,
            "time": appointment.time,
            "status": appointment.status,
        }))
    }
}

pub struct CancelMyAppointment(pub ToolDeps);

#[async_trait]
impl Tool for CancelMyAppointment {
    fn name(&self) -> &str {
        "cancel_my_appointment"
    }

    fn description(&self) -> &str {
        "Cancel one of the caller's appointments"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "appointment_id": { "type": "string" } },
            "required": ["appointment_id"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            appointment_id: String,
        }
        let a: Args = args(self.name(), input)?;
        let appointment = own_appointment(&self.0, self.name(), scope, &a.appointment_id).await?;
        self.0
            .storage
            .update_appointment_status(
                &appointment.id,
                AppointmentStatus::Cancelled,
                Some("cliente cancelou"),
            )
            .await?;
        ToolOutput::json(&json!({ "appointment_id": appointment.id, "status": "cancelled" }))
    }
}

pub struct RescheduleMyAppointment(pub ToolDeps);

#[async_trait]
impl Tool for RescheduleMyAppointment {
    fn name(&self) -> &str {
        "reschedule_my_appointment"
    }

    fn description(&self) -> &str {
        "Move one of the caller's appointments to another free date and time"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "appointment_id": { "type": "string" },
                "date": { "type": "string", "description": "YYYY-MM-DD" },
                "time": { "type": "string", "description": "HH:MM" }
            },
            "required": ["appointment_id", "date", "time"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            appointment_id: String,
            date: String,
            time: String,
        }
        let a: Args = args(self.name(), input)?;
        let appointment = own_appointment(&self.0, self.name(), scope, &a.appointment_id).await?;
        let date = date_arg(self.name(), &a.date, self.0.ledger.today())?;
        let time = time_arg(self.name(), &a.time)?;
        ensure_free(&self.0, self.name(), &appointment.tenant_id, date, &time).await?;

        let date = date.format("%Y-%m-%d").to_string();
        self.0
            .storage
            .update_appointment_slot(&appointment.id, &date, &time)
            .await?;
        ToolOutput::json(&json!({
            "appointment_id": appointment.id,
            "date": date,
            "time": time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, harness, seed_appointment, seed_service, Harness};
    use agendo_core::AccountRole;
    use agendo_skill::ToolRole;

    fn scope() -> ToolScope {
        ToolScope {
            role: ToolRole::Client,
            tenant_id: Some("o1".into()),
            calendar_id: Some("o1".into()),
            roster: vec!["o1".into()],
            caller_account_id: Some("c1".into()),
            caller_phone: "5511911111111".into(),
        }
    }

    async fn seeded() -> Harness {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        h.storage
            .upsert_account(&account("c1", "5511911111111", AccountRole::Client))
            .await
            .unwrap();
        h.storage
            .upsert_account(&account("c2", "5511922222222", AccountRole::Client))
            .await
            .unwrap();
        seed_service(&h, "s1", "o1", "Corte", 4500).await;
        h
    }

    fn deps(h: &Harness) -> ToolDeps {
        ToolDeps {
            storage: h.storage.clone(),
            ledger: h.ctx.ledger.clone(),
        }
    }

    #[tokio::test]
    async fn create_then_conflict() {
        let h = seeded().await;
        let tool = CreateAppointment(deps(&h));
        let out = tool
            .invoke(
                &scope(),
                json!({"service_id": "s1", "date": "2025-06-03", "time": "10:00"}),
            )
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(out.content.contains("\"status\":\"pending\""));

        let rival = ToolScope {
            caller_account_id: Some("c2".into()),
            caller_phone: "5511922222222".into(),
            ..scope()
        };
        let err = tool
            .invoke(
                &rival,
                json!({"service_id": "s1", "date": "2025-06-03", "time": "10:00"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgendoError::Tool { .. }));
    }

    #[tokio::test]
    async fn create_rejects_unknown_service_and_past_dates() {
        let h = seeded().await;
        let tool = CreateAppointment(deps(&h));
        assert!(
            tool.invoke(&scope(), json!({"service_id": "nope", "date": "2025-06-03", "time": "10:00"}))
                .await
                .is_err()
        );
        assert!(
            tool.invoke(&scope(), json!({"service_id": "s1", "date": "2025-06-01", "time": "10:00"}))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn availability_excludes_lead_time_today() {
        let h = seeded().await;
        let out = CheckAvailability(deps(&h))
            .invoke(&scope(), json!({"date": "2025-06-02"}))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&out.content).unwrap();
        let free = parsed["free_times"].as_array().unwrap();
        assert_eq!(free[0], "11:00");
    }

    #[tokio::test]
    async fn clients_only_touch_their_own_bookings() {
        let h = seeded().await;
        seed_appointment(&h, "mine", "o1", "c1", "2025-06-04", "09:00").await;
        seed_appointment(&h, "theirs", "o1", "c2", "2025-06-04", "10:00").await;

        let cancel = CancelMyAppointment(deps(&h));
        assert!(cancel.invoke(&scope(), json!({"appointment_id": "theirs"})).await.is_err());
        cancel
            .invoke(&scope(), json!({"appointment_id": "mine"}))
            .await
            .unwrap();
        let stored = h.storage.get_appointment("mine").await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.cancel_reason.as_deref(), Some("cliente cancelou"));
    }

    #[tokio::test]
    async fn reschedule_moves_to_free_slot_only() {
        let h = seeded().await;
        seed_appointment(&h, "mine", "o1", "c1", "2025-06-04", "09:00").await;
        seed_appointment(&h, "theirs", "o1", "c2", "2025-06-04", "10:00").await;
        let tool = RescheduleMyAppointment(deps(&h));

        assert!(
            tool.invoke(&scope(), json!({"appointment_id": "mine", "date": "2025-06-04", "time": "10:00"}))
                .await
                .is_err()
        );
        tool.invoke(&scope(), json!({"appointment_id": "mine", "date": "2025-06-05", "time": "15h"}))
            .await
            .unwrap();
        let stored = h.storage.get_appointment("mine").await.unwrap().unwrap();
        assert_eq!((stored.date.as_str(), stored.time.as_str()), ("2025-06-05", "15:00"));
    }

    #[tokio::test]
    async fn my_appointments_lists_by_phone() {
        let h = seeded().await;
        seed_appointment(&h, "mine", "o1", "c1", "2025-06-04", "09:00").await;
        seed_appointment(&h, "theirs", "o1", "c2", "2025-06-04", "10:00").await;
        let out = ListMyAppointments(deps(&h))
            .invoke(&scope(), json!({}))
            .await
            .unwrap();
        assert!(out.content.contains("mine"));
        assert!(!out.content.contains("theirs"));
    }
}
