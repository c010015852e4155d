// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue session CRUD operations.

use agendo_core::{AgendoError, Session};
use rusqlite::{OptionalExtension, params};

use super::{json_column, parse_column, to_json};
use crate::database::Database;

/// Loads the session for an address.
///
/// A row whose state or JSON columns cannot be decoded is an error, not `None`.
pub async fn get(db: &Database, address: &str) -> Result<Option<Session>, AgendoError> {
    let address = address.to_string();
    db.call(move |conn| {
        conn.query_row(
            "SELECT address, state, user_id, tenant_id, draft, metadata, updated_at \
             FROM sessions WHERE address = ?1",
            params![address],
            |row| {
                Ok(Session {
                    address: row.get(0)?,
                    state: parse_column(row, 1)?,
                    user_id: row.get(2)?,
                    tenant_id: row.get(3)?,
                    draft: json_column(row, 4)?,
                    metadata: json_column(row, 5)?,
                    updated_at: row.get(6)?,
                })
            },
        )
        .optional()
    })
    .await
}

pub async fn put(db: &Database, session: &Session) -> Result<(), AgendoError> {
    let session = session.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO sessions (address, state, user_id, tenant_id, draft, metadata, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(address) DO UPDATE SET state = excluded.state, \
             user_id = excluded.user_id, tenant_id = excluded.tenant_id, \
             draft = excluded.draft, metadata = excluded.metadata, \
             updated_at = excluded.updated_at",
            params![
                session.address,
                session.state.to_string(),
                session.user_id,
                session.tenant_id,
                to_json(&session.draft)?,
                to_json(&session.metadata)?,
                session.updated_at,
            ],
        )?;
        Ok(())
    })
    .await
}

pub async fn delete(db: &Database, address: &str) -> Result<(), AgendoError> {
    let address = address.to_string();
    db.call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE address = ?1", params![address])?;
        Ok(())
    })
    .await
}
