// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn input and output of the persona state machines.

use agendo_core::{AgendoError, OutboundMessage, Session};
use async_trait::async_trait;

use crate::identity::Identity;

/// One inbound message after normalization and identity resolution.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Normalized phone digits of the speaker.
    pub address: String,
    /// Trimmed message text.
    pub text: String,
    /// Lowercased, diacritic-free copy of `text`.
    pub folded: String,
    pub identity: Identity,
}

impl Turn {
    /// A message back to the speaker.
    pub fn reply(&self, text: impl Into<String>) -> OutboundMessage {
        OutboundMessage {
            address: self.address.clone(),
            text: text.into(),
            tenant_id: self.identity.tenant_id.clone(),
        }
    }

    /// A fresh session for the speaker, bound to the resolved account and tenant.
    pub fn new_session(&self, state: agendo_core::DialogueState) -> Session {
        let mut session = Session::new(self.address.clone(), state);
        session.user_id = self.identity.account_id().map(str::to_string);
        session.tenant_id = self.identity.tenant_id.clone();
        session
    }
}

/// What to do with the stored session after a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Keep(Session),
    Delete,
}

/// Result of a state machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub session: SessionUpdate,
    /// Messages to deliver in order; addresses may differ from the speaker.
    pub messages: Vec<OutboundMessage>,
}

impl Outcome {
    pub fn keep(session: Session, message: OutboundMessage) -> Self {
        Self {
            session: SessionUpdate::Keep(session),
            messages: vec![message],
        }
    }

    pub fn delete(message: OutboundMessage) -> Self {
        Self {
            session: SessionUpdate::Delete,
            messages: vec![message],
        }
    }

    /// Appends a message, typically a notification to a third party.
    pub fn and(mut self, message: OutboundMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// The stored session after this outcome, if any.
    pub fn kept(&self) -> Option<&Session> {
        match &self.session {
            SessionUpdate::Keep(s) => Some(s),
            SessionUpdate::Delete => None,
        }
    }
}

/// A persona's conversation flow.
#[async_trait]
pub trait PersonaMachine: Send + Sync {
    /// Enters the persona's initial state.
    async fn start(&self, turn: &Turn) -> Result<Outcome, AgendoError>;

    /// Advances from the stored session's state.
    async fn step(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError>;
}
