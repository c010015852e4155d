// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue engine for the Agendo scheduling assistant.
//!
//! The [`DialogueEngine`] is the central coordinator that:
//! - Resolves who is speaking and which tenant the conversation is about
//! - Routes each message to the client, management or registration machine
//! - Persists per-address sessions between messages
//! - Delegates free text to the intent layer or the tool-calling orchestrator
//! - Delivers replies and notifications through the channel adapter

pub mod agenda;
pub mod client;
pub mod context;
pub mod identity;
pub mod intent;
pub mod ledger;
pub mod management;
pub mod orchestrator;
pub mod registration;
pub mod router;
pub mod session;
pub mod shutdown;
pub mod templates;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use context::EngineContext;
pub use identity::{Identity, resolve_identity};
pub use intent::{Intent, IntentLayer};
pub use ledger::Ledger;
pub use orchestrator::{AgentTurn, GenerationSettings, Orchestrator, derive_role};
pub use router::DialogueEngine;
pub use session::{Outcome, PersonaMachine, SessionUpdate, Turn};
