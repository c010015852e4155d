// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Agendo scheduling engine.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer model via
//! `tokio-rusqlite`. Holds accounts, services, the appointment ledger,
//! dialogue sessions and working hours.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
