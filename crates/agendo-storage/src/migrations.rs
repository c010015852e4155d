// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! database open.

use agendo_core::AgendoError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AgendoError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AgendoError::storage(format!("migration failed: {e}")))?;
    Ok(())
}
