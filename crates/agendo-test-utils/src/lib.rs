// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Agendo integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted LLM provider capturing every request
//! - [`MockChannel`] - Channel capturing outbound messages
//! - [`FlakyStorage`] - Storage wrapper failing chosen operations on demand
//! - [`MockPayments`] - Payment gateway returning predictable links
//! - [`TestHarness`] - Full engine over a temp SQLite database and a frozen clock

pub mod flaky_storage;
pub mod harness;
pub mod mock_channel;
pub mod mock_payments;
pub mod mock_provider;

pub use flaky_storage::FlakyStorage;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
pub use mock_payments::MockPayments;
pub use mock_provider::MockProvider;
