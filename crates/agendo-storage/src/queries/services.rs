// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service catalog operations.

use agendo_core::{AgendoError, Service};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::Database;

fn from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        price_cents: row.get(3)?,
        duration_minutes: row.get(4)?,
    })
}

/// Services of a tenant, in insertion order.
pub async fn list(db: &Database, tenant_id: &str) -> Result<Vec<Service>, AgendoError> {
    let tenant_id = tenant_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, name, price_cents, duration_minutes \
             FROM services WHERE tenant_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![tenant_id], from_row)?;
        rows.collect()
    })
    .await
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Service>, AgendoError> {
    let id = id.to_string();
    db.call(move |conn| {
        conn.query_row(
            "SELECT id, tenant_id, name, price_cents, duration_minutes FROM services WHERE id = ?1",
            params![id],
            from_row,
        )
        .optional()
    })
    .await
}

/// Inserts all services in one transaction.
pub async fn insert_many(db: &Database, services: &[Service]) -> Result<(), AgendoError> {
    let services = services.to_vec();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO services (id, tenant_id, name, price_cents, duration_minutes) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for s in &services {
                stmt.execute(params![
                    s.id,
                    s.tenant_id,
                    s.name,
                    s.price_cents,
                    s.duration_minutes
                ])?;
            }
        }
        tx.commit()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    fn service(id: &str, tenant: &str, name: &str, price: i64) -> Service {
        Service {
            id: id.into(),
            tenant_id: tenant.into(),
            name: name.into(),
            price_cents: price,
            duration_minutes: 30,
        }
    }

    #[tokio::test]
    async fn services_keep_insertion_order_per_tenant() {
        let (db, _dir) = setup_db().await;
        insert_many(
            &db,
            &[
                service("s2", "t1", "Corte Social", 4500),
                service("s1", "t1", "Barba", 3000),
                service("s3", "t2", "Manicure", 2500),
            ],
        )
        .await
        .unwrap();

        let listed = list(&db, "t1").await.unwrap();
        let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Corte Social", "Barba"]);
        assert_eq!(get(&db, "s3").await.unwrap().unwrap().price_cents, 2500);
        assert!(get(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_batch_inserts_nothing() {
        let (db, _dir) = setup_db().await;
        let result = insert_many(
            &db,
            &[service("dup", "t1", "A", 1), service("dup", "t1", "B", 2)],
        )
        .await;
        assert!(result.is_err());
        assert!(list(&db, "t1").await.unwrap().is_empty());
    }
}
