// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side views over a roster's appointments: agenda, revenue, lookups.

use std::collections::HashMap;

use agendo_core::text::fold;
use agendo_core::{
    AgendoError, Appointment, AppointmentFilter, AppointmentStatus, PaymentStatus, StorageAdapter,
};
use chrono::NaiveDate;

use crate::ledger::normalize_time;
use crate::templates::{format_brl, short_date};

/// An appointment joined with display names.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaEntry {
    pub appointment: Appointment,
    pub client_name: String,
    pub service_name: String,
    pub professional_name: String,
}

/// Memoizes account and service names while building views.
#[derive(Default)]
struct Names {
    accounts: HashMap<String, String>,
    services: HashMap<String, (String, i64)>,
}

impl Names {
    async fn account(
        &mut self,
        storage: &dyn StorageAdapter,
        id: &str,
    ) -> Result<String, AgendoError> {
        if let Some(name) = self.accounts.get(id) {
            return Ok(name.clone());
        }
        let name = storage
            .get_account(id)
            .await?
            .map(|a| a.display_name().to_string())
            .unwrap_or_else(|| "cliente".to_string());
        self.accounts.insert(id.to_string(), name.clone());
        Ok(name)
    }

    async fn service(
        &mut self,
        storage: &dyn StorageAdapter,
        id: &str,
    ) -> Result<(String, i64), AgendoError> {
        if let Some(entry) = self.services.get(id) {
            return Ok(entry.clone());
        }
        let entry = storage
            .get_service(id)
            .await?
            .map(|s| (s.name, s.price_cents))
            .unwrap_or_else(|| ("serviço".to_string(), 0));
        self.services.insert(id.to_string(), entry.clone());
        Ok(entry)
    }

    async fn entry(
        &mut self,
        storage: &dyn StorageAdapter,
        appointment: Appointment,
    ) -> Result<AgendaEntry, AgendoError> {
        let professional_name = self.account(storage, &appointment.tenant_id).await?;
        let (client_name, service_name) = if appointment.status == AppointmentStatus::Blocked {
            ("bloqueado".to_string(), String::new())
        } else {
            (
                self.account(storage, &appointment.client_id).await?,
                self.service(storage, &appointment.service_id).await?.0,
            )
        };
        Ok(AgendaEntry {
            appointment,
            client_name,
            service_name,
            professional_name,
        })
    }
}

fn roster_filter(roster: &[String]) -> AppointmentFilter {
    AppointmentFilter {
        tenant_ids: roster.to_vec(),
        exclude_cancelled: true,
        ..Default::default()
    }
}

/// Non-cancelled appointments (blocked rows included) of the roster on `date`.
pub async fn agenda_for(
    storage: &dyn StorageAdapter,
    roster: &[String],
    date: &str,
) -> Result<Vec<AgendaEntry>, AgendoError> {
    if roster.is_empty() {
        return Ok(Vec::new());
    }
    let filter = AppointmentFilter {
        date: Some(date.to_string()),
        ..roster_filter(roster)
    };
    with_names(storage, storage.list_appointments(&filter).await?).await
}

/// Joins appointments with client, service and professional names.
pub async fn with_names(
    storage: &dyn StorageAdapter,
    appointments: Vec<Appointment>,
) -> Result<Vec<AgendaEntry>, AgendoError> {
    let mut names = Names::default();
    let mut entries = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        entries.push(names.entry(storage, appointment).await?);
    }
    Ok(entries)
}

/// A caller's active bookings from `today` on, matched by phone suffix.
pub async fn caller_bookings(
    storage: &dyn StorageAdapter,
    phone: &str,
    today: NaiveDate,
) -> Result<Vec<Appointment>, AgendoError> {
    let filter = AppointmentFilter {
        client_phone_suffix: Some(phone.to_string()),
        date_from: Some(today.format("%Y-%m-%d").to_string()),
        exclude_cancelled: true,
        exclude_blocked: true,
        ..Default::default()
    };
    storage.list_appointments(&filter).await
}

fn status_label(appointment: &Appointment) -> &'static str {
    match (appointment.status, appointment.payment_status) {
        (AppointmentStatus::Blocked, _) => "bloqueado",
        (_, PaymentStatus::Paid) => "pago",
        (AppointmentStatus::Confirmed, _) => "confirmado",
        (AppointmentStatus::Completed, _) => "concluído",
        _ => "pendente",
    }
}

/// Human-readable agenda; names the professional when several are listed.
pub fn format_agenda(entries: &[AgendaEntry], date: NaiveDate) -> String {
    if entries.is_empty() {
        return format!("Nenhum agendamento para {}.", short_date(date));
    }
    let several = entries
        .windows(2)
        .any(|w| w[0].appointment.tenant_id != w[1].appointment.tenant_id);
    let mut lines = vec![format!("Agenda de {}:", short_date(date))];
    for e in entries {
        let mut line = if e.appointment.status == AppointmentStatus::Blocked {
            format!("{} - bloqueado", e.appointment.time)
        } else {
            format!(
                "{} - {} ({}) [{}]",
                e.appointment.time,
                e.client_name,
                e.service_name,
                status_label(&e.appointment)
            )
        };
        if several {
            line.push_str(&format!(" · {}", e.professional_name));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Paid appointments of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Revenue {
    pub count: usize,
    pub total_cents: i64,
}

impl Revenue {
    pub fn describe(&self, date: NaiveDate) -> String {
        format!(
            "Faturamento de {}: {} atendimento(s) pago(s), total {}.",
            short_date(date),
            self.count,
            format_brl(self.total_cents)
        )
    }
}

pub async fn revenue_for(
    storage: &dyn StorageAdapter,
    roster: &[String],
    date: &str,
) -> Result<Revenue, AgendoError> {
    if roster.is_empty() {
        return Ok(Revenue::default());
    }
    let filter = AppointmentFilter {
        date: Some(date.to_string()),
        exclude_blocked: true,
        payment_status: Some(PaymentStatus::Paid),
        ..roster_filter(roster)
    };
    let mut names = Names::default();
    let mut revenue = Revenue::default();
    for appointment in storage.list_appointments(&filter).await? {
        let (_, price) = names.service(storage, &appointment.service_id).await?;
        revenue.count += 1;
        revenue.total_cents += price;
    }
    Ok(revenue)
}

/// The next `count` bookings at or after `now` (`date`, `HH:MM`).
pub async fn upcoming(
    storage: &dyn StorageAdapter,
    roster: &[String],
    today: NaiveDate,
    now_hhmm: &str,
    count: usize,
) -> Result<Vec<Appointment>, AgendoError> {
    if roster.is_empty() {
        return Ok(Vec::new());
    }
    let today_key = today.format("%Y-%m-%d").to_string();
    let filter = AppointmentFilter {
        date_from: Some(today_key.clone()),
        exclude_blocked: true,
        ..roster_filter(roster)
    };
    Ok(storage
        .list_appointments(&filter)
        .await?
        .into_iter()
        .filter(|a| a.date > today_key || a.time.as_str() >= now_hhmm)
        .take(count)
        .collect())
}

/// Finds the booking a manager most likely means.
///
/// Candidates are the roster's non-cancelled, non-blocked appointments,
/// narrowed by client-name and time substrings, closest date first.
pub async fn best_match(
    storage: &dyn StorageAdapter,
    roster: &[String],
    today: NaiveDate,
    client_name: Option<&str>,
    time: Option<&str>,
) -> Result<Option<AgendaEntry>, AgendoError> {
    if roster.is_empty() {
        return Ok(None);
    }
    let filter = AppointmentFilter {
        exclude_blocked: true,
        ..roster_filter(roster)
    };
    let name_query = client_name.map(fold).filter(|q| !q.is_empty());
    let time_query = time
        .map(|t| normalize_time(t).unwrap_or_else(|| t.trim().to_string()))
        .filter(|q| !q.is_empty());

    let mut names = Names::default();
    let mut candidates = Vec::new();
    for appointment in storage.list_appointments(&filter).await? {
        if let Some(q) = &time_query
            && !appointment.time.contains(q.as_str())
        {
            continue;
        }
        let entry = names.entry(storage, appointment).await?;
        if let Some(q) = &name_query
            && !fold(&entry.client_name).contains(q.as_str())
        {
            continue;
        }
        candidates.push(entry);
    }

    let distance = |e: &AgendaEntry| {
        NaiveDate::parse_from_str(&e.appointment.date, "%Y-%m-%d")
            .map(|d| (d - today).num_days().abs())
            .unwrap_or(i64::MAX)
    };
    candidates.sort_by(|a, b| {
        distance(a)
            .cmp(&distance(b))
            .then_with(|| a.appointment.time.cmp(&b.appointment.time))
    });
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, harness, seed_appointment, seed_service};
    use agendo_core::AccountRole;

    async fn seeded() -> crate::test_support::Harness {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        let mut owner = account("o1", "5511900000001", AccountRole::Owner);
        owner.name = Some("Barbearia Central".into());
        h.storage.upsert_account(&owner).await.unwrap();
        for (id, phone, name) in [("c1", "5511911111111", "Maria Silva"), ("c2", "5511922222222", "João")] {
            let mut c = account(id, phone, AccountRole::Client);
            c.name = Some(name.into());
            h.storage.upsert_account(&c).await.unwrap();
        }
        seed_service(&h, "s1", "o1", "Corte", 4500).await;
        seed_appointment(&h, "a1", "o1", "c1", "2025-06-02", "14:00").await;
        seed_appointment(&h, "a2", "o1", "c2", "2025-06-02", "09:00").await;
        seed_appointment(&h, "a3", "o1", "c1", "2025-06-05", "14:00").await;
        seed_appointment(&h, "a4", "o1", "c2", "2025-05-30", "14:00").await;
        h
    }

    fn roster() -> Vec<String> {
        vec!["o1".to_string()]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn best_match_prefers_closest_date() {
        let h = seeded().await;
        let hit = best_match(h.storage.as_ref(), &roster(), today(), Some("maria"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.appointment.id, "a1");

        let hit = best_match(h.storage.as_ref(), &roster(), today(), None, Some("14h"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.appointment.id, "a1");

        let hit = best_match(h.storage.as_ref(), &roster(), today(), Some("joao"), Some("14:00"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.appointment.id, "a4");
    }

    #[tokio::test]
    async fn best_match_without_candidates() {
        let h = seeded().await;
        let miss = best_match(h.storage.as_ref(), &roster(), today(), Some("pedro"), None)
            .await
            .unwrap();
        assert!(miss.is_none());
        let other = best_match(h.storage.as_ref(), &["o9".to_string()], today(), None, None)
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn upcoming_skips_past_times() {
        let h = seeded().await;
        let next = upcoming(h.storage.as_ref(), &roster(), today(), "10:00", 5)
            .await
            .unwrap();
        let ids: Vec<&str> = next.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[tokio::test]
    async fn revenue_sums_paid_only() {
        let h = seeded().await;
        h.storage.update_payment_status("a1", PaymentStatus::Paid).await.unwrap();
        let revenue = revenue_for(h.storage.as_ref(), &roster(), "2025-06-02").await.unwrap();
        assert_eq!(revenue, Revenue { count: 1, total_cents: 4500 });
        assert!(revenue.describe(today()).contains("R$ 45,00"));
    }

    #[tokio::test]
    async fn agenda_lists_day_in_time_order() {
        let h = seeded().await;
        let entries = agenda_for(h.storage.as_ref(), &roster(), "2025-06-02").await.unwrap();
        let text = format_agenda(&entries, today());
        assert_eq!(
            text,
            "Agenda de 02/06:\n09:00 - João (Corte) [pendente]\n14:00 - Maria Silva (Corte) [pendente]"
        );
        assert_eq!(format_agenda(&[], today()), "Nenhum agendamento para 02/06.");
    }
}
