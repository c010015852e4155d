// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot availability engine and the appointment ledger write paths.
//!
//! A professional's day is a template of fixed-length slots between opening
//! and closing time. Every non-cancelled appointment, including blocked rows,
//! makes its slot busy. Booking re-checks the slot before inserting and the
//! store rejects a second non-cancelled row for the same slot.

use std::collections::BTreeSet;
use std::sync::Arc;

use agendo_config::model::SchedulingConfig;
use agendo_core::{
    AgendoError, Appointment, AppointmentFilter, Clock, StorageAdapter, WorkingHours,
};
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use tracing::{debug, info};

/// Parses `HH:MM` into minutes after midnight.
pub fn minutes_of(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let (h, m): (u32, u32) = (h.parse().ok()?, m.parse().ok()?);
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Normalizes loose time spellings (`9:00`, `14h`, `14h30`, `14`) to `HH:MM`.
pub fn normalize_time(raw: &str) -> Option<String> {
    let raw = raw.trim().to_lowercase().replace('h', ":");
    let raw = raw.trim_end_matches(':');
    let (h, m) = raw.split_once(':').unwrap_or((raw, "0"));
    let (h, m): (u32, u32) = (h.trim().parse().ok()?, m.trim().parse().ok()?);
    (h < 24 && m < 60).then(|| hhmm(h * 60 + m))
}

fn hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// All slot start times of a working day, `open <= t < close`.
pub fn template_slots(hours: &WorkingHours) -> Vec<String> {
    let (Some(open), Some(close)) = (minutes_of(&hours.open), minutes_of(&hours.close)) else {
        return Vec::new();
    };
    if hours.slot_minutes == 0 {
        return Vec::new();
    }
    (open..close)
        .step_by(hours.slot_minutes as usize)
        .map(hhmm)
        .collect()
}

/// Whether the professional works on `date`.
pub fn is_working_day(hours: &WorkingHours, date: NaiveDate) -> bool {
    let weekday = date.weekday().num_days_from_sunday() as u8;
    hours.weekdays.contains(&weekday)
}

/// Parses a stored or model-supplied date (`YYYY-MM-DD` or `DD/MM[/YYYY]`).
///
/// Day-month dates without a year resolve to the next occurrence on or after
/// `today`.
pub fn parse_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(date);
    }
    let (d, m) = raw.split_once('/')?;
    let (d, m): (u32, u32) = (d.trim().parse().ok()?, m.trim().parse().ok()?);
    let this_year = NaiveDate::from_ymd_opt(today.year(), m, d)?;
    if this_year >= today {
        Some(this_year)
    } else {
        NaiveDate::from_ymd_opt(today.year() + 1, m, d)
    }
}

/// The scheduling core shared by the state machines and the tools.
pub struct Ledger {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    scheduling: SchedulingConfig,
}

impl Ledger {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        scheduling: SchedulingConfig,
    ) -> Self {
        Self {
            storage,
            clock,
            scheduling,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Tenant-local wall time as `HH:MM`.
    pub fn now_hhmm(&self) -> String {
        let now = self.clock.now();
        hhmm(now.hour() * 60 + now.minute())
    }

    /// Working hours applied when a professional has none stored.
    pub fn default_hours(&self) -> WorkingHours {
        WorkingHours {
            open: self.scheduling.open.clone(),
            close: self.scheduling.close.clone(),
            slot_minutes: self.scheduling.slot_minutes,
            weekdays: self.scheduling.weekdays.clone(),
        }
    }

    pub async fn working_hours(&self, professional_id: &str) -> Result<WorkingHours, AgendoError> {
        Ok(self
            .storage
            .get_availability(professional_id)
            .await?
            .unwrap_or_else(|| self.default_hours()))
    }

    /// The dates offered by the date chooser: tomorrow onwards.
    pub fn booking_dates(&self) -> Vec<NaiveDate> {
        let today = self.today();
        (1..=i64::from(self.scheduling.booking_window_days))
            .map(|offset| today + Duration::days(offset))
            .collect()
    }

    /// Times held by a non-cancelled appointment on `date`.
    pub async fn busy_times(
        &self,
        professional_id: &str,
        date: &str,
    ) -> Result<BTreeSet<String>, AgendoError> {
        let filter = AppointmentFilter {
            tenant_ids: vec![professional_id.to_string()],
            date: Some(date.to_string()),
            exclude_cancelled: true,
            ..Default::default()
        };
        Ok(self
            .storage
            .list_appointments(&filter)
            .await?
            .into_iter()
            .map(|a| a.time)
            .collect())
    }

    /// Bookable start times for `professional_id` on `date`.
    pub async fn free_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, AgendoError> {
        let hours = self.working_hours(professional_id).await?;
        if !is_working_day(&hours, date) {
            return Ok(Vec::new());
        }
        let key = date.format("%Y-%m-%d").to_string();
        let busy = self.busy_times(professional_id, &key).await?;
        let mut free: Vec<String> = template_slots(&hours)
            .into_iter()
            .filter(|slot| !busy.contains(slot))
            .collect();

        if date == self.today() {
            let now = self.clock.now();
            let cutoff = now.hour() * 60 + now.minute() + self.scheduling.lead_time_minutes;
            free.retain(|slot| minutes_of(slot).is_some_and(|m| m >= cutoff));
        }
        Ok(free)
    }

    /// Inserts an appointment after checking its slot is still open.
    pub async fn book(&self, appointment: &Appointment) -> Result<(), AgendoError> {
        let filter =
            AppointmentFilter::slot(&appointment.tenant_id, &appointment.date, &appointment.time);
        if !self.storage.list_appointments(&filter).await?.is_empty() {
            return Err(AgendoError::SlotTaken {
                tenant_id: appointment.tenant_id.clone(),
                date: appointment.date.clone(),
                time: appointment.time.clone(),
            });
        }
        self.storage.insert_appointment(appointment).await?;
        info!(
            tenant_id = %appointment.tenant_id,
            date = %appointment.date,
            time = %appointment.time,
            appointment_id = %appointment.id,
            "appointment booked"
        );
        Ok(())
    }

    /// Blocks one slot or, without `time`, every free template slot of the
    /// day. Returns the number of slots newly blocked.
    pub async fn block(
        &self,
        professional_id: &str,
        date: NaiveDate,
        time: Option<&str>,
    ) -> Result<usize, AgendoError> {
        let key = date.format("%Y-%m-%d").to_string();
        let times = match time {
            Some(t) => {
                let valid = normalize_time(t)
                    .ok_or_else(|| AgendoError::InvalidInput(format!("invalid time: {t}")))?;
                vec![valid]
            }
            None => {
                let hours = self.working_hours(professional_id).await?;
                let busy = self.busy_times(professional_id, &key).await?;
                template_slots(&hours)
                    .into_iter()
                    .filter(|slot| !busy.contains(slot))
                    .collect()
            }
        };
        let rows: Vec<Appointment> = times
            .iter()
            .map(|t| Appointment::blocked(professional_id, &key, t))
            .collect();
        let inserted = self.storage.batch_insert_appointments(&rows).await?;
        debug!(candidates = rows.len(), inserted, "block batch written");
        info!(tenant_id = %professional_id, date = %key, inserted, "slots blocked");
        Ok(inserted)
    }
}
