// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Agendo scheduling engine.

use thiserror::Error;

/// The primary error type used across all Agendo adapter traits and engine operations.
///
/// Conversational flows never surface these to end users; the dialogue router
/// logs them and answers with a short in-persona apology instead.
#[derive(Debug, Error)]
pub enum AgendoError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (bridge unreachable, rejected delivery).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, malformed structured output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A non-cancelled appointment already occupies the requested slot.
    #[error("slot {date} {time} already taken for tenant {tenant_id}")]
    SlotTaken {
        tenant_id: String,
        date: String,
        time: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller-supplied data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A tool invocation failed or was rejected.
    #[error("tool {name} failed: {message}")]
    Tool { name: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AgendoError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        AgendoError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a storage error built from a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        AgendoError::Storage {
            source: message.into().into(),
        }
    }

    /// Returns true when the error is a slot conflict.
    pub fn is_slot_taken(&self) -> bool {
        matches!(self, AgendoError::SlotTaken { .. })
    }
}

impl From<serde_json::Error> for AgendoError {
    fn from(e: serde_json::Error) -> Self {
        AgendoError::Internal(format!("serialization failed: {e}"))
    }
}
