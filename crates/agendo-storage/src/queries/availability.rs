// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working-hours templates.

use agendo_core::{AgendoError, WorkingHours};
use rusqlite::{OptionalExtension, params};

use super::{json_column, to_json};
use crate::database::Database;

pub async fn get(db: &Database, tenant_id: &str) -> Result<Option<WorkingHours>, AgendoError> {
    let tenant_id = tenant_id.to_string();
    db.call(move |conn| {
        conn.query_row(
            "SELECT open, close, slot_minutes, weekdays FROM availability WHERE tenant_id = ?1",
            params![tenant_id],
            |row| {
                Ok(WorkingHours {
                    open: row.get(0)?,
                    close: row.get(1)?,
                    slot_minutes: row.get(2)?,
                    weekdays: json_column(row, 3)?,
                })
            },
        )
        .optional()
    })
    .await
}

pub async fn set(db: &Database, tenant_id: &str, hours: &WorkingHours) -> Result<(), AgendoError> {
    let tenant_id = tenant_id.to_string();
    let hours = hours.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO availability (tenant_id, open, close, slot_minutes, weekdays) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(tenant_id) DO UPDATE SET open = excluded.open, \
             close = excluded.close, slot_minutes = excluded.slot_minutes, \
             weekdays = excluded.weekdays",
            params![
                tenant_id,
                hours.open,
                hours.close,
                hours.slot_minutes,
                to_json(&hours.weekdays)?,
            ],
        )?;
        Ok(())
    })
    .await
}
