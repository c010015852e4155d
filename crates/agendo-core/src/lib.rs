// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Agendo scheduling engine.
//!
//! This crate provides the error type, the domain and message types, and the
//! adapter traits implemented by storage, transport, LLM and payment backends.

pub mod clock;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AgendoError;
pub use types::*;

pub use traits::{ChannelAdapter, PaymentGateway, PluginAdapter, ProviderAdapter, StorageAdapter};
