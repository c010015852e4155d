// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment ledger operations.
//!
//! The partial unique index `idx_appointments_slot` guarantees at most one
//! non-cancelled row per (tenant, date, time); violations surface as
//! [`AgendoError::SlotTaken`].

use agendo_core::text::phone_suffix;
use agendo_core::{
    AgendoError, Appointment, AppointmentFilter, AppointmentStatus, PaymentStatus,
};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::parse_column;
use crate::database::{Database, is_constraint_violation};

const COLUMNS: &str = "a.id, a.tenant_id, a.client_id, a.service_id, a.date, a.time, \
                       a.status, a.payment_status, a.cancel_reason, a.created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        client_id: row.get(2)?,
        service_id: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        status: parse_column(row, 6)?,
        payment_status: parse_column(row, 7)?,
        cancel_reason: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Builds the WHERE clause and bound values for a filter.
fn where_clause(filter: &AppointmentFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    fn bind(values: &mut Vec<Value>, v: String) -> String {
        values.push(Value::Text(v));
        format!("?{}", values.len())
    }

    if !filter.tenant_ids.is_empty() {
        let marks: Vec<String> = filter
            .tenant_ids
            .iter()
            .map(|t| bind(&mut values, t.clone()))
            .collect();
        clauses.push(format!("a.tenant_id IN ({})", marks.join(", ")));
    }
    if let Some(client_id) = &filter.client_id {
        let m = bind(&mut values, client_id.clone());
        clauses.push(format!("a.client_id = {m}"));
    }
    if let Some(phone) = &filter.client_phone_suffix {
        let m = bind(&mut values, phone_suffix(phone));
        clauses.push(format!(
            "a.client_id IN (SELECT id FROM accounts WHERE phone_suffix = {m})"
        ));
    }
    if let Some(date) = &filter.date {
        let m = bind(&mut values, date.clone());
        clauses.push(format!("a.date = {m}"));
    }
    if let Some(from) = &filter.date_from {
        let m = bind(&mut values, from.clone());
        clauses.push(format!("a.date >= {m}"));
    }
    if let Some(time) = &filter.time {
        let m = bind(&mut values, time.clone());
        clauses.push(format!("a.time = {m}"));
    }
    if !filter.statuses.is_empty() {
        let marks: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| bind(&mut values, s.to_string()))
            .collect();
        clauses.push(format!("a.status IN ({})", marks.join(", ")));
    }
    if filter.exclude_cancelled {
        clauses.push("a.status <> 'cancelled'".to_string());
    }
    if filter.exclude_blocked {
        clauses.push("a.status <> 'blocked'".to_string());
    }
    if let Some(payment) = filter.payment_status {
        let m = bind(&mut values, payment.to_string());
        clauses.push(format!("a.payment_status = {m}"));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (sql, values)
}

/// Lists matching appointments ordered by date, time.
pub async fn list(
    db: &Database,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, AgendoError> {
    let (clause, values) = where_clause(filter);
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM appointments a{clause} ORDER BY a.date, a.time, a.created_at"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), from_row)?;
        rows.collect()
    })
    .await
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Appointment>, AgendoError> {
    let id = id.to_string();
    db.call(move |conn| {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM appointments a WHERE a.id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    })
    .await
}

fn slot_taken(a: &Appointment) -> AgendoError {
    AgendoError::SlotTaken {
        tenant_id: a.tenant_id.clone(),
        date: a.date.clone(),
        time: a.time.clone(),
    }
}

/// Inserts one appointment, mapping a slot collision to `SlotTaken`.
pub async fn insert(db: &Database, appointment: &Appointment) -> Result<(), AgendoError> {
    let row = appointment.clone();
    let inserted = db
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO appointments (id, tenant_id, client_id, service_id, date, time, \
                 status, payment_status, cancel_reason, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.id,
                    row.tenant_id,
                    row.client_id,
                    row.service_id,
                    row.date,
                    row.time,
                    row.status.to_string(),
                    row.payment_status.to_string(),
                    row.cancel_reason,
                    row.created_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await?;
    if inserted {
        Ok(())
    } else {
        Err(slot_taken(appointment))
    }
}

fn not_found(id: &str) -> AgendoError {
    AgendoError::NotFound {
        entity: "appointment",
        id: id.to_string(),
    }
}

pub async fn update_status(
    db: &Database,
    id: &str,
    status: AppointmentStatus,
    cancel_reason: Option<&str>,
) -> Result<(), AgendoError> {
    let key = id.to_string();
    let reason = cancel_reason.map(str::to_string);
    let outcome = db
        .call(move |conn| {
            let result = conn.execute(
                "UPDATE appointments SET status = ?1, \
                 cancel_reason = COALESCE(?2, cancel_reason) WHERE id = ?3",
                params![status.to_string(), reason, key],
            );
            match result {
                Ok(changed) => Ok(Some(changed)),
                Err(e) if is_constraint_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await?;
    match outcome {
        Some(0) => Err(not_found(id)),
        Some(_) => Ok(()),
        // Reviving a cancelled row onto an occupied slot.
        None => match get(db, id).await? {
            Some(a) => Err(slot_taken(&a)),
            None => Err(not_found(id)),
        },
    }
}

pub async fn update_payment(
    db: &Database,
    id: &str,
    status: PaymentStatus,
) -> Result<(), AgendoError> {
    let key = id.to_string();
    let changed = db
        .call(move |conn| {
            conn.execute(
                "UPDATE appointments SET payment_status = ?1 WHERE id = ?2",
                params![status.to_string(), key],
            )
        })
        .await?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn update_slot(
    db: &Database,
    id: &str,
    date: &str,
    time: &str,
) -> Result<(), AgendoError> {
    let key = id.to_string();
    let (new_date, new_time) = (date.to_string(), time.to_string());
    let outcome = db
        .call(move |conn| {
            let result = conn.execute(
                "UPDATE appointments SET date = ?1, time = ?2 WHERE id = ?3",
                params![new_date, new_time, key],
            );
            match result {
                Ok(changed) => Ok(Some(changed)),
                Err(e) if is_constraint_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await?;
    match outcome {
        Some(0) => Err(not_found(id)),
        Some(_) => Ok(()),
        None => {
            let tenant_id = get(db, id).await?.map(|a| a.tenant_id).unwrap_or_default();
            Err(AgendoError::SlotTaken {
                tenant_id,
                date: date.to_string(),
                time: time.to_string(),
            })
        }
    }
}

pub async fn delete(db: &Database, id: &str) -> Result<(), AgendoError> {
    let id = id.to_string();
    db.call(move |conn| {
        conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
        Ok(())
    })
    .await
}

/// Inserts rows atomically with `INSERT OR IGNORE`, returning how many landed.
pub async fn batch_insert(
    db: &Database,
    appointments: &[Appointment],
) -> Result<usize, AgendoError> {
    let rows = appointments.to_vec();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO appointments (id, tenant_id, client_id, service_id, \
                 date, time, status, payment_status, cancel_reason, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in &rows {
                inserted += stmt.execute(params![
                    row.id,
                    row.tenant_id,
                    row.client_id,
                    row.service_id,
                    row.date,
                    row.time,
                    row.status.to_string(),
                    row.payment_status.to_string(),
                    row.cancel_reason,
                    row.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    })
    .await
}
