// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single entry point for inbound chat messages.
//!
//! Normalizes the message, resolves the speaker, applies the global overrides
//! (onboarding, reset words, persona mismatch), runs one persona machine step
//! and then persists the session before delivering the outbound messages.
//! With per-address serialization the delivery happens under the turn lock,
//! so replies leave in the order their turns changed the session.

use std::sync::Arc;

use agendo_core::text::{fold, normalize_phone};
use agendo_core::{
    Account, AgendoError, ChannelAdapter, InboundMessage, OutboundMessage, Persona, Session,
    StateFamily,
};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::ClientMachine;
use crate::context::EngineContext;
use crate::identity::{Identity, resolve_identity};
use crate::management::ManagementMachine;
use crate::registration::RegistrationMachine;
use crate::session::{Outcome, PersonaMachine, SessionUpdate, Turn};
use crate::templates::{CLIENT_APOLOGY, MANAGEMENT_APOLOGY};

/// The dialogue engine: routes every inbound message to a persona machine.
pub struct DialogueEngine {
    ctx: Arc<EngineContext>,
    channel: Arc<dyn ChannelAdapter>,
    client: ClientMachine,
    management: ManagementMachine,
    registration: RegistrationMachine,
    /// Per-address turn locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DialogueEngine {
    pub fn new(ctx: Arc<EngineContext>, channel: Arc<dyn ChannelAdapter>) -> Self {
        info!(
            agent_name = ctx.config.agent.name.as_str(),
            serialize_per_address = ctx.config.dialogue.serialize_per_address,
            "dialogue engine initialized"
        );
        Self {
            client: ClientMachine::new(ctx.clone()),
            management: ManagementMachine::new(ctx.clone()),
            registration: RegistrationMachine::new(ctx.clone()),
            ctx,
            channel,
            locks: DashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Processes one inbound message and returns the messages handed to the
    /// channel. Empty messages are ignored.
    pub async fn on_inbound_message(&self, msg: InboundMessage) -> Vec<OutboundMessage> {
        let address = normalize_phone(&msg.address);
        let text = msg.text.trim().to_string();
        if address.is_empty() || text.is_empty() {
            debug!(raw_address = %msg.address, "ignoring empty inbound message");
            return Vec::new();
        }

        let lock = self
            .ctx
            .config
            .dialogue
            .serialize_per_address
            .then(|| self.locks.entry(address.clone()).or_default().clone());
        let guard = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let messages = self.process(&address, text, &msg).await;
        let sent = self.deliver(messages).await;

        drop(guard);
        if let Some(lock) = lock {
            drop(lock);
            self.locks.remove_if(&address, |_, l| Arc::strong_count(l) == 1);
        }
        sent
    }

    async fn process(&self, address: &str, text: String, msg: &InboundMessage) -> Vec<OutboundMessage> {
        let storage = self.ctx.storage.as_ref();
        let identity = match resolve_identity(
            storage,
            address,
            msg.tenant_hint.as_deref(),
            msg.is_self_channel,
        )
        .await
        {
            Ok(identity) => identity,
            Err(e) => {
                error!(address, error = %e, "identity resolution failed");
                return vec![apology(address, msg.tenant_hint.clone(), Persona::Client)];
            }
        };
        let persona = identity.persona;
        let tenant_id = identity.tenant_id.clone();

        match self.run_turn(address, text, identity).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(address, persona = %persona, error = %e, "turn failed");
                vec![apology(address, tenant_id, persona)]
            }
        }
    }

    async fn run_turn(
        &self,
        address: &str,
        text: String,
        mut identity: Identity,
    ) -> Result<Vec<OutboundMessage>, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        let dialogue = &self.ctx.config.dialogue;
        let folded = fold(&text);

        let session = match storage.get_session(address).await {
            Ok(session) => session,
            Err(e) => {
                warn!(address, error = %e, "stored session unreadable, starting over");
                None
            }
        };
        let reset = dialogue.reset_words.iter().any(|w| fold(w) == folded);
        let registering = session
            .as_ref()
            .is_some_and(|s| s.state.family() == StateFamily::Registration);
        let triggered = identity.account.is_none()
            && !identity.persona.is_management()
            && dialogue
                .registration_triggers
                .iter()
                .any(|t| folded.contains(fold(t).as_str()));

        if !reset && (registering || triggered) {
            let turn = Turn { address: address.to_string(), text, folded, identity };
            let outcome = match session.filter(|_| registering) {
                Some(session) => self.registration.step(&turn, session).await?,
                None => self.registration.start(&turn).await?,
            };
            return self.persist(address, outcome).await;
        }

        if identity.persona == Persona::Guest {
            let guest = Account::guest(uuid::Uuid::new_v4().to_string(), address);
            storage.upsert_account(&guest).await?;
            info!(address, account_id = %guest.id, "guest account created");
            identity.account = Some(guest);
            identity.persona = Persona::Client;
        }

        let (machine, family): (&dyn PersonaMachine, StateFamily) = if identity.persona.is_management() {
            (&self.management, StateFamily::Management)
        } else {
            (&self.client, StateFamily::Client)
        };
        let turn = Turn { address: address.to_string(), text, folded, identity };
        let outcome = match session {
            Some(session) if !reset && session.state.family() == family => {
                machine.step(&turn, session).await?
            }
            _ => {
                debug!(address, reset, persona = %turn.identity.persona, "entering initial state");
                machine.start(&turn).await?
            }
        };
        self.persist(address, outcome).await
    }

    async fn persist(&self, address: &str, outcome: Outcome) -> Result<Vec<OutboundMessage>, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        match outcome.session {
            SessionUpdate::Keep(mut session) => {
                session.updated_at = self.ctx.clock.now().to_rfc3339();
                debug!(address, state = %session.state, "session stored");
                storage.put_session(&session).await?;
            }
            SessionUpdate::Delete => {
                storage.delete_session(address).await?;
                info!(address, "session closed");
            }
        }
        Ok(outcome.messages)
    }

    async fn deliver(&self, messages: Vec<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut sent = Vec::with_capacity(messages.len());
        for message in messages {
            if message.text.trim().is_empty() || message.address.is_empty() {
                continue;
            }
            if let Err(e) = self.channel.send(message.clone()).await {
                warn!(address = %message.address, error = %e, "outbound message not delivered");
            }
            sent.push(message);
        }
        sent
    }

    /// The stored session of an address, if any.
    pub async fn session_of(&self, address: &str) -> Result<Option<Session>, AgendoError> {
        self.ctx.storage.get_session(&normalize_phone(address)).await
    }
}

fn apology(address: &str, tenant_id: Option<String>, persona: Persona) -> OutboundMessage {
    let text = if persona.is_management() { MANAGEMENT_APOLOGY } else { CLIENT_APOLOGY };
    OutboundMessage {
        address: address.to_string(),
        text: text.to_string(),
        tenant_id,
    }
}
