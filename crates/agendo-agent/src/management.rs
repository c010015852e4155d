// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner and staff management flow.
//!
//! A numbered menu plus free-text commands. Free text is classified by the
//! intent layer; the menu action the manager picked, if any, is passed along
//! as a hint. Executed commands return to `admin_menu`.

use std::sync::Arc;

use agendo_core::{
    AgendoError, AppointmentStatus, DialogueState, OutboundMessage, PaymentStatus, Session,
};
use agendo_skill::ToolScope;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::agenda::{AgendaEntry, agenda_for, best_match, format_agenda, revenue_for, upcoming, with_names};
use crate::context::EngineContext;
use crate::intent::Intent;
use crate::ledger::{normalize_time, parse_date};
use crate::orchestrator::{AgentTurn, derive_role};
use crate::session::{Outcome, PersonaMachine, Turn};
use crate::templates::{
    INTENT_APOLOGY, MANAGEMENT_MENU_OPTIONS, display_date, short_date, with_menu_nudge,
};

const DEFAULT_CANCEL_REASON: &str = "imprevisto na agenda";
const NO_MATCH: &str = "Não encontrei esse agendamento. Informe o nome do cliente e/ou o horário.";

pub struct ManagementMachine {
    ctx: Arc<EngineContext>,
}

/// The action a manager picked from the menu while free text is pending.
fn pending_action(state: DialogueState) -> Option<&'static str> {
    match state {
        DialogueState::AdminAwaitingConfirm => Some("confirm_appointment"),
        DialogueState::AdminAwaitingPaid => Some("mark_paid"),
        DialogueState::AdminAwaitingCancel => Some("cancel_appointment"),
        DialogueState::AdminAwaitingBlock => Some("block_day"),
        _ => None,
    }
}

fn when(entry: &AgendaEntry) -> String {
    format!("{} às {}", display_date(&entry.appointment.date), entry.appointment.time)
}

impl ManagementMachine {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    async fn establishment_name(&self, turn: &Turn) -> Result<String, AgendoError> {
        let tenant = match turn.identity.tenant_id.as_deref() {
            Some(id) => self.ctx.storage.get_account(id).await?,
            None => None,
        };
        Ok(tenant
            .and_then(|t| t.bot.name.or(t.name))
            .unwrap_or_else(|| self.ctx.config.agent.name.clone()))
    }

    fn menu_choice(&self, turn: &Turn, mut session: Session) -> Option<Outcome> {
        let (state, prompt) = match turn.folded.as_str() {
            "2" => (
                DialogueState::AdminAwaitingConfirm,
                "Qual agendamento confirmar? Informe o nome do cliente e/ou o horário.",
            ),
            "3" => (
                DialogueState::AdminAwaitingPaid,
                "Qual agendamento marcar como pago? Informe o nome do cliente e/ou o horário.",
            ),
            "4" => (
                DialogueState::AdminAwaitingCancel,
                "Qual agendamento cancelar? Informe o nome do cliente e/ou o horário.",
            ),
            "5" => (
                DialogueState::AdminAwaitingBlock,
                "Qual dia bloquear? Ex.: 10/06, ou 10/06 14:00 para um só horário.",
            ),
            "7" => (
                DialogueState::AdminAiChat,
                "Modo assistente. Pergunte o que quiser sobre a agenda. Digite *menu* para voltar.",
            ),
            _ => return None,
        };
        session.state = state;
        Some(Outcome::keep(session, turn.reply(prompt)))
    }

    async fn dispatch_menu(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let today = self.ctx.clock.today();
        match turn.folded.as_str() {
            "1" => {
                session.state = DialogueState::AdminMenu;
                let text = self.show_agenda(turn, today).await?;
                Ok(Outcome::keep(session, turn.reply(text)))
            }
            "6" => {
                session.state = DialogueState::AdminMenu;
                let revenue =
                    revenue_for(self.ctx.storage.as_ref(), &turn.identity.roster, &self.ctx.today_key())
                        .await?;
                Ok(Outcome::keep(session, turn.reply(revenue.describe(today))))
            }
            _ => match self.menu_choice(turn, session.clone()) {
                Some(outcome) => Ok(outcome),
                None => self.command(turn, session, None).await,
            },
        }
    }

    async fn show_agenda(&self, turn: &Turn, date: NaiveDate) -> Result<String, AgendoError> {
        let key = date.format("%Y-%m-%d").to_string();
        let entries = agenda_for(self.ctx.storage.as_ref(), &turn.identity.roster, &key).await?;
        Ok(format_agenda(&entries, date))
    }

    async fn command(
        &self,
        turn: &Turn,
        mut session: Session,
        hint: Option<&str>,
    ) -> Result<Outcome, AgendoError> {
        let today = self.ctx.clock.today();
        let intent = match self.ctx.intents.detect(&turn.text, hint, today).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(address = %turn.address, error = %e, "intent detection failed");
                return Ok(Outcome::keep(session, turn.reply(INTENT_APOLOGY)));
            }
        };
        debug!(address = %turn.address, intent = intent.name(), hint = ?hint, "intent detected");

        if intent == Intent::None {
            return self.converse(turn, session).await;
        }
        let mut notices = Vec::new();
        let text = self.execute(turn, intent, today, &mut notices).await?;
        session.state = DialogueState::AdminMenu;
        let mut outcome = Outcome::keep(session, turn.reply(text));
        for notice in notices {
            outcome = outcome.and(notice);
        }
        Ok(outcome)
    }

    async fn execute(
        &self,
        turn: &Turn,
        intent: Intent,
        today: NaiveDate,
        notices: &mut Vec<OutboundMessage>,
    ) -> Result<String, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        let roster = &turn.identity.roster;
        match intent {
            Intent::ShowAgenda { date } => {
                let date = date.as_deref().and_then(|d| parse_date(d, today)).unwrap_or(today);
                self.show_agenda(turn, date).await
            }
            Intent::CancelNext { count, reason } => {
                let count = count.unwrap_or(1).max(1) as usize;
                let reason = reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
                let now = self.ctx.ledger.now_hhmm();
                let next = upcoming(storage, roster, today, &now, count).await?;
                if next.is_empty() {
                    return Ok("Não há próximos agendamentos para cancelar.".to_string());
                }
                let entries = with_names(storage, next).await?;
                let mut lines = Vec::new();
                let mut failed = 0;
                for entry in &entries {
                    match self.cancel(turn, entry, &reason, notices).await {
                        Ok(()) => lines.push(format!("- {} {}", when(entry), entry.client_name)),
                        Err(e) => {
                            warn!(appointment_id = %entry.appointment.id, error = %e, "cancellation failed");
                            failed += 1;
                        }
                    }
                }
                let mut text = String::new();
                if !lines.is_empty() {
                    text = format!("Cancelado(s) {} agendamento(s):\n{}", lines.len(), lines.join("\n"));
                }
                if failed > 0 {
                    if !text.is_empty() {
                        text.push_str("\n\n");
                    }
                    text.push_str(&format!("Não consegui cancelar {failed} agendamento(s). Tente novamente."));
                }
                Ok(text)
            }
            Intent::CancelAppointment { client_name, time, reason } => {
                let Some(entry) =
                    best_match(storage, roster, today, client_name.as_deref(), time.as_deref()).await?
                else {
                    return Ok(NO_MATCH.to_string());
                };
                let reason = reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
                self.cancel(turn, &entry, &reason, notices).await?;
                Ok(format!("Agendamento de {} ({}) cancelado.", entry.client_name, when(&entry)))
            }
            Intent::ConfirmAppointment { client_name, time } => {
                let Some(entry) =
                    best_match(storage, roster, today, client_name.as_deref(), time.as_deref()).await?
                else {
                    return Ok(NO_MATCH.to_string());
                };
                storage
                    .update_appointment_status(&entry.appointment.id, AppointmentStatus::Confirmed, None)
                    .await?;
                info!(appointment_id = %entry.appointment.id, "appointment confirmed by manager");
                let text = format!(
                    "Olá, {}! Seu horário de {} ({}) está confirmado.",
                    entry.client_name,
                    when(&entry),
                    entry.service_name
                );
                self.notify_client(turn, &entry, text, notices).await;
                Ok(format!("Agendamento de {} ({}) confirmado.", entry.client_name, when(&entry)))
            }
            Intent::MarkPaid { client_name, time } => {
                let Some(entry) =
                    best_match(storage, roster, today, client_name.as_deref(), time.as_deref()).await?
                else {
                    return Ok(NO_MATCH.to_string());
                };
                storage
                    .update_payment_status(&entry.appointment.id, PaymentStatus::Paid)
                    .await?;
                info!(appointment_id = %entry.appointment.id, "appointment marked paid");
                Ok(format!("Pagamento registrado: {} ({}).", entry.client_name, when(&entry)))
            }
            Intent::BlockDay { date, time } => {
                let date = date.as_deref().and_then(|d| parse_date(d, today)).unwrap_or(today);
                let Some(calendar) = turn
                    .identity
                    .calendar_id
                    .clone()
                    .or_else(|| turn.identity.tenant_id.clone())
                else {
                    return Ok("Nenhuma agenda selecionada para bloquear.".to_string());
                };
                let time = time.as_deref().and_then(normalize_time);
                let blocked = self.ctx.ledger.block(&calendar, date, time.as_deref()).await?;
                Ok(match (blocked, time) {
                    (0, _) => format!("Nenhum horário livre para bloquear em {}.", short_date(date)),
                    (_, Some(t)) => format!("Horário {t} de {} bloqueado.", short_date(date)),
                    (n, None) => format!("Bloqueei {n} horário(s) em {}.", short_date(date)),
                })
            }
            Intent::None => Ok(String::new()),
        }
    }

    async fn cancel(
        &self,
        turn: &Turn,
        entry: &AgendaEntry,
        reason: &str,
        notices: &mut Vec<OutboundMessage>,
    ) -> Result<(), AgendoError> {
        self.ctx
            .storage
            .update_appointment_status(&entry.appointment.id, AppointmentStatus::Cancelled, Some(reason))
            .await?;
        info!(appointment_id = %entry.appointment.id, reason, "appointment cancelled by manager");
        let text = format!(
            "Olá, {}! Infelizmente seu horário de {} precisou ser cancelado. Motivo: {reason}. Digite *menu* para reagendar.",
            entry.client_name,
            when(entry)
        );
        self.notify_client(turn, entry, text, notices).await;
        Ok(())
    }

    /// Best-effort: the status change already happened.
    async fn notify_client(
        &self,
        turn: &Turn,
        entry: &AgendaEntry,
        text: String,
        notices: &mut Vec<OutboundMessage>,
    ) {
        match self.ctx.storage.get_account(&entry.appointment.client_id).await {
            Ok(Some(client)) => notices.push(OutboundMessage {
                address: client.phone,
                text,
                tenant_id: turn.identity.tenant_id.clone(),
            }),
            Ok(None) => warn!(
                appointment_id = %entry.appointment.id,
                "client account missing, notification skipped"
            ),
            Err(e) => warn!(
                appointment_id = %entry.appointment.id,
                error = %e,
                "client lookup failed, notification skipped"
            ),
        }
    }

    async fn converse(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        let establishment = self.establishment_name(turn).await?;
        let identity = &turn.identity;
        let scope = ToolScope {
            role: derive_role(identity.account.as_ref(), true),
            tenant_id: identity.tenant_id.clone(),
            calendar_id: identity.calendar_id.clone(),
            roster: identity.roster.clone(),
            caller_account_id: identity.account_id().map(str::to_string),
            caller_phone: turn.address.clone(),
        };
        let system_prompt = format!(
            "Você é o assistente de gestão de {establishment}. Ajude o profissional com agenda, pagamentos e equipe. Responda em português, em poucas frases."
        );
        let nudge = &self.ctx.config.dialogue.menu_nudge;
        let text = match self
            .ctx
            .orchestrator
            .run(AgentTurn {
                text: turn.text.clone(),
                scope,
                system_prompt,
            })
            .await
        {
            Ok(reply) => with_menu_nudge(&reply, nudge),
            Err(e) => {
                warn!(address = %turn.address, error = %e, "management assistant unavailable");
                format!("Desculpe, não consegui responder agora. {nudge}")
            }
        };
        Ok(Outcome::keep(session, turn.reply(text)))
    }
}

#[async_trait]
impl PersonaMachine for ManagementMachine {
    async fn start(&self, turn: &Turn) -> Result<Outcome, AgendoError> {
        let session = turn.new_session(DialogueState::AdminMenu);
        let establishment = self.establishment_name(turn).await?;
        let name = turn
            .identity
            .account
            .as_ref()
            .and_then(|a| a.name.clone())
            .unwrap_or(establishment.clone());
        let text = format!("Olá, {name}! Painel de {establishment}:\n{MANAGEMENT_MENU_OPTIONS}");
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    async fn step(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        debug!(address = %turn.address, state = %session.state, "management step");
        match session.state {
            DialogueState::AdminMenu => self.dispatch_menu(turn, session).await,
            DialogueState::AdminAiChat => {
                if matches!(turn.folded.as_str(), "1" | "2" | "3" | "4" | "5" | "6" | "7") {
                    self.dispatch_menu(turn, session).await
                } else {
                    self.command(turn, session, None).await
                }
            }
            state => match pending_action(state) {
                Some(hint) => self.command(turn, session, Some(hint)).await,
                None => self.start(turn).await,
            },
        }
    }
}
