// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account lookups and upserts.

use agendo_core::text::phone_suffix;
use agendo_core::{Account, AgendoError, BotPersona};
use rusqlite::{OptionalExtension, Row, params};

use super::{json_column, parse_column, to_json};
use crate::database::Database;

const COLUMNS: &str = "id, phone, name, email, role, owner_id, niche, plan, \
                       subscription_status, bot, initial_services, created_at";

/// Management accounts sort ahead of clients; named accounts ahead of guests.
const PRECEDENCE: &str = "CASE role WHEN 'super_admin' THEN 0 WHEN 'owner' THEN 1 \
                          WHEN 'staff' THEN 2 ELSE 3 END, \
                          (name IS NULL), created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: parse_column(row, 4)?,
        owner_id: row.get(5)?,
        niche: row.get(6)?,
        plan: row.get(7)?,
        subscription_status: parse_column(row, 8)?,
        bot: json_column(row, 9)?,
        initial_services: row.get(10)?,
        created_at: row.get(11)?,
    })
}

pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Account>, AgendoError> {
    let suffix = phone_suffix(phone);
    if suffix.is_empty() {
        return Ok(None);
    }
    db.call(move |conn| {
        conn.query_row(
            &format!(
                "SELECT {COLUMNS} FROM accounts WHERE phone_suffix = ?1 ORDER BY {PRECEDENCE} LIMIT 1"
            ),
            params![suffix],
            from_row,
        )
        .optional()
    })
    .await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Account>, AgendoError> {
    let email = email.trim().to_lowercase();
    db.call(move |conn| {
        conn.query_row(
            &format!(
                "SELECT {COLUMNS} FROM accounts WHERE lower(email) = ?1 ORDER BY {PRECEDENCE} LIMIT 1"
            ),
            params![email],
            from_row,
        )
        .optional()
    })
    .await
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Account>, AgendoError> {
    let id = id.to_string();
    db.call(move |conn| {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM accounts WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()
    })
    .await
}

pub async fn upsert(db: &Database, account: &Account) -> Result<(), AgendoError> {
    let account = account.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO accounts (id, phone, phone_suffix, name, email, role, owner_id, niche, \
             plan, subscription_status, bot, initial_services, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(id) DO UPDATE SET phone = excluded.phone, \
             phone_suffix = excluded.phone_suffix, name = excluded.name, \
             email = excluded.email, role = excluded.role, owner_id = excluded.owner_id, \
             niche = excluded.niche, plan = excluded.plan, \
             subscription_status = excluded.subscription_status, bot = excluded.bot, \
             initial_services = excluded.initial_services",
            params![
                account.id,
                account.phone,
                phone_suffix(&account.phone),
                account.name,
                account.email.as_deref().map(str::to_lowercase),
                account.role.to_string(),
                account.owner_id,
                account.niche,
                account.plan,
                account.subscription_status.to_string(),
                to_json(&account.bot)?,
                account.initial_services,
                account.created_at,
            ],
        )?;
        Ok(())
    })
    .await
}

pub async fn list_tenants(db: &Database) -> Result<Vec<Account>, AgendoError> {
    db.call(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE role = 'owner' ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect()
    })
    .await
}

pub async fn list_staff(db: &Database, tenant_id: &str) -> Result<Vec<Account>, AgendoError> {
    let tenant_id = tenant_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE role = 'staff' AND owner_id = ?1 \
             ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![tenant_id], from_row)?;
        rows.collect()
    })
    .await
}

pub async fn update_bot(db: &Database, id: &str, bot: &BotPersona) -> Result<(), AgendoError> {
    let key = id.to_string();
    let bot = bot.clone();
    let changed = db
        .call(move |conn| {
            conn.execute(
                "UPDATE accounts SET bot = ?1 WHERE id = ?2",
                params![to_json(&bot)?, key],
            )
        })
        .await?;
    if changed == 0 {
        return Err(AgendoError::NotFound {
            entity: "account",
            id: id.to_string(),
        });
    }
    Ok(())
}
