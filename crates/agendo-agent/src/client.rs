// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client booking flow.
//!
//! professional → main menu → service → date → time → (name → email) →
//! confirmation. Every `awaiting_*` state re-prompts on invalid input; the
//! menu, the appointment list and the chat state fall back to the assistant.

use std::sync::Arc;

use agendo_core::{
    Account, AccountRole, AgendoError, Appointment, AppointmentStatus, DialogueState, Draft,
    OutboundMessage, PaymentStatus, Service, Session, SessionMetadata,
};
use agendo_skill::ToolScope;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::agenda::{caller_bookings, with_names};
use crate::context::EngineContext;
use crate::identity::roster_accounts;
use crate::orchestrator::{AgentTurn, derive_role};
use crate::session::{Outcome, PersonaMachine, Turn};
use crate::templates::{
    self, CLIENT_MENU_OPTIONS, DEFAULT_CONFIRMATION, DEFAULT_GREETING, DEFAULT_GREETING_ANONYMOUS,
    RESTART, SLOT_TAKEN, display_date, format_brl, labeled_date, numbered, parse_choice,
    with_menu_nudge,
};
use crate::tools::services_offered;

const INVALID: &str = "Opção inválida.";

pub struct ClientMachine {
    ctx: Arc<EngineContext>,
}

/// Display data of the professional a session is booking with.
struct Establishment {
    professional: Option<Account>,
    owner: Option<Account>,
}

impl Establishment {
    fn name(&self, fallback: &str) -> String {
        self.owner
            .as_ref()
            .and_then(|o| o.bot.name.clone().or_else(|| o.name.clone()))
            .unwrap_or_else(|| fallback.to_string())
    }

    fn professional_name(&self) -> String {
        self.professional
            .as_ref()
            .map(|p| p.display_name().to_string())
            .unwrap_or_default()
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.id.as_str())
    }
}

fn is_yes(folded: &str) -> bool {
    matches!(folded, "1" | "sim" | "s" | "confirmar" | "confirmo")
}

fn is_no(folded: &str) -> bool {
    matches!(folded, "2" | "nao" | "n" | "cancelar")
}

fn valid_email(text: &str) -> bool {
    let text = text.trim();
    !text.contains(char::is_whitespace) && text.contains('@') && text.contains('.')
}

impl ClientMachine {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    async fn establishment(&self, professional_id: Option<&str>) -> Result<Establishment, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        let professional = match professional_id {
            Some(id) => storage.get_account(id).await?,
            None => None,
        };
        let owner = match &professional {
            Some(p) if p.role == AccountRole::Staff => match p.owner_id.as_deref() {
                Some(owner_id) => storage.get_account(owner_id).await?,
                None => None,
            },
            other => other.clone(),
        };
        Ok(Establishment { professional, owner })
    }

    async fn client_account(&self, turn: &Turn, session: &Session) -> Result<Option<Account>, AgendoError> {
        match session.user_id.as_deref() {
            Some(id) => self.ctx.storage.get_account(id).await,
            None => Ok(turn.identity.account.clone()),
        }
    }

    fn chooser(&self, turn: &Turn, mut session: Session, accounts: &[Account], heading: &str) -> Outcome {
        session.state = DialogueState::AwaitingProfessional;
        session.metadata.professional_ids = accounts.iter().map(|a| a.id.clone()).collect();
        let names: Vec<&str> = accounts.iter().map(Account::display_name).collect();
        Outcome::keep(session, turn.reply(format!("{heading}\n{}", numbered(&names))))
    }

    async fn main_menu(&self, turn: &Turn, mut session: Session, prefix: Option<&str>) -> Result<Outcome, AgendoError> {
        session.state = DialogueState::MainMenu;
        session.draft = Draft::default();
        session.metadata.service_ids.clear();
        session.metadata.appointment_ids.clear();

        let place = self.establishment(session.tenant_id.as_deref()).await?;
        let client = self.client_account(turn, &session).await?;
        let user_name = client.as_ref().and_then(|c| c.name.clone());
        let template = place
            .owner
            .as_ref()
            .and_then(|o| o.bot.greeting_template.clone())
            .unwrap_or_else(|| {
                if user_name.is_some() { DEFAULT_GREETING } else { DEFAULT_GREETING_ANONYMOUS }.to_string()
            });
        let establishment = place.name(&self.ctx.config.agent.name);
        let barber = place.professional_name();
        let greeting = templates::render(
            &template,
            &[
                ("user_name", user_name.as_deref().unwrap_or("")),
                ("establishment_name", &establishment),
                ("barber_name", &barber),
            ],
        );

        let mut text = String::new();
        if let Some(prefix) = prefix {
            text.push_str(prefix);
            text.push_str("\n\n");
        }
        text.push_str(&format!("{greeting}\n\nComo posso ajudar?\n{CLIENT_MENU_OPTIONS}"));
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    async fn offer_services(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let Some(professional) = session.tenant_id.clone() else {
            return self.start(turn).await;
        };
        let place = self.establishment(Some(&professional)).await?;
        let services =
            services_offered(self.ctx.storage.as_ref(), &professional, place.owner_id()).await?;
        if services.is_empty() {
            let text = "Desculpe, ainda não há serviços disponíveis para agendamento. Digite *menu* para voltar.";
            return Ok(Outcome::keep(session, turn.reply(text)));
        }
        session.state = DialogueState::AwaitingService;
        session.metadata.service_ids = services.iter().map(|s| s.id.clone()).collect();
        Ok(Outcome::keep(session, turn.reply(service_prompt(&services, None))))
    }

    async fn list_bookings(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        let bookings = caller_bookings(storage, &turn.address, self.ctx.clock.today()).await?;
        if bookings.is_empty() {
            let text = "Você não tem agendamentos futuros. Digite *menu* para voltar.";
            return Ok(Outcome::keep(session, turn.reply(text)));
        }
        let entries = with_names(storage, bookings).await?;
        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                format!(
                    "{} às {} - {} com {}",
                    display_date(&e.appointment.date),
                    e.appointment.time,
                    e.service_name,
                    e.professional_name
                )
            })
            .collect();
        session.state = DialogueState::ManagingAppointments;
        session.metadata.appointment_ids = entries.iter().map(|e| e.appointment.id.clone()).collect();
        let text = format!(
            "Seus agendamentos:\n{}\n\nPara cancelar, envie o número. Digite *menu* para voltar.",
            numbered(&lines)
        );
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    async fn main_menu_choice(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        match turn.folded.as_str() {
            "1" => self.offer_services(turn, session).await,
            "2" => self.list_bookings(turn, session).await,
            "3" => {
                session.state = DialogueState::AiChat;
                let text = "Claro! Pode me perguntar o que quiser sobre serviços e horários. Digite *menu* para voltar.";
                Ok(Outcome::keep(session, turn.reply(text)))
            }
            _ => self.assistant(turn, session).await,
        }
    }

    async fn pick_professional(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let ids = session.metadata.professional_ids.clone();
        let Some(idx) = parse_choice(&turn.text, ids.len()) else {
            let mut accounts = Vec::new();
            for id in &ids {
                if let Some(acc) = self.ctx.storage.get_account(id).await? {
                    accounts.push(acc);
                }
            }
            return Ok(self.chooser(turn, session, &accounts, &format!("{INVALID} Escolha uma opção:")));
        };
        let Some(chosen) = self.ctx.storage.get_account(&ids[idx]).await? else {
            return self.start(turn).await;
        };

        if session.tenant_id.is_none() {
            let tenant = chosen.managed_tenant_id().to_string();
            let roster = roster_accounts(self.ctx.storage.as_ref(), &tenant).await?;
            session.tenant_id = Some(tenant);
            if roster.len() > 1 {
                return Ok(self.chooser(turn, session, &roster, "Com qual profissional você quer agendar?"));
            }
        } else {
            session.tenant_id = Some(chosen.id.clone());
        }
        debug!(address = %turn.address, professional = ?session.tenant_id, "professional chosen");
        self.main_menu(turn, session, None).await
    }

    async fn pick_service(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let ids = session.metadata.service_ids.clone();
        let Some(idx) = parse_choice(&turn.text, ids.len()) else {
            let mut services = Vec::new();
            for id in &ids {
                if let Some(s) = self.ctx.storage.get_service(id).await? {
                    services.push(s);
                }
            }
            return Ok(Outcome::keep(session, turn.reply(service_prompt(&services, Some(INVALID)))));
        };
        session.draft.service_id = Some(ids[idx].clone());
        let dates = self.ctx.ledger.booking_dates();
        session.draft.offered_dates = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        session.state = DialogueState::AwaitingDate;
        Ok(Outcome::keep(session, turn.reply(date_prompt(&dates, None))))
    }

    async fn pick_date(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let offered: Vec<NaiveDate> = session
            .draft
            .offered_dates
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .collect();
        let Some(idx) = parse_choice(&turn.text, offered.len()) else {
            return Ok(Outcome::keep(session, turn.reply(date_prompt(&offered, Some(INVALID)))));
        };
        let Some(professional) = session.tenant_id.clone() else {
            return self.start(turn).await;
        };
        let date = offered[idx];
        let free = self.ctx.ledger.free_slots(&professional, date).await?;
        if free.is_empty() {
            let note = format!("Não há horários livres em {}.", labeled_date(date));
            return Ok(Outcome::keep(session, turn.reply(date_prompt(&offered, Some(&note)))));
        }
        session.draft.date = Some(date.format("%Y-%m-%d").to_string());
        session.draft.offered_times = free;
        session.state = DialogueState::AwaitingTime;
        let text = format!(
            "Horários livres em {}:\n{}",
            labeled_date(date),
            numbered(&session.draft.offered_times)
        );
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    async fn pick_time(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let times = session.draft.offered_times.clone();
        let Some(idx) = parse_choice(&turn.text, times.len()) else {
            let text = format!("{INVALID} Escolha um horário:\n{}", numbered(&times));
            return Ok(Outcome::keep(session, turn.reply(text)));
        };
        session.draft.time = Some(times[idx].clone());

        let known = self
            .client_account(turn, &session)
            .await?
            .and_then(|c| c.name);
        match known {
            Some(name) => {
                session.draft.name = Some(name);
                self.confirmation(turn, session, None).await
            }
            None => {
                session.state = DialogueState::AwaitingName;
                Ok(Outcome::keep(session, turn.reply("Qual é o seu nome?")))
            }
        }
    }

    fn capture_name(&self, turn: &Turn, mut session: Session) -> Outcome {
        let name = turn.text.trim();
        if name.chars().count() < 2 {
            return Outcome::keep(session, turn.reply("Por favor, informe seu nome (mínimo 2 letras)."));
        }
        session.draft.name = Some(name.to_string());
        session.state = DialogueState::AwaitingEmail;
        Outcome::keep(session, turn.reply("Qual é o seu e-mail?"))
    }

    async fn capture_email(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        if !valid_email(&turn.text) {
            return Ok(Outcome::keep(
                session,
                turn.reply("E-mail inválido. Informe um e-mail como nome@exemplo.com"),
            ));
        }
        let email = turn.text.trim().to_lowercase();
        let storage = self.ctx.storage.as_ref();

        let existing = storage
            .find_account_by_email(&email)
            .await?
            .filter(|a| a.role == AccountRole::Client);
        let mut account = match existing {
            Some(acc) => {
                debug!(address = %turn.address, account_id = %acc.id, "linking phone to account by email");
                acc
            }
            None => match self.client_account(turn, &session).await? {
                Some(acc) => acc,
                None => Account::guest(uuid::Uuid::new_v4().to_string(), turn.address.clone()),
            },
        };
        account.phone = turn.address.clone();
        account.email = Some(email.clone());
        if let Some(name) = &session.draft.name {
            account.name = Some(name.clone());
        }
        storage.upsert_account(&account).await?;

        session.user_id = Some(account.id);
        session.draft.email = Some(email);
        self.confirmation(turn, session, None).await
    }

    async fn confirmation(&self, turn: &Turn, mut session: Session, prefix: Option<&str>) -> Result<Outcome, AgendoError> {
        session.state = DialogueState::AwaitingConfirmation;
        let service = match session.draft.service_id.as_deref() {
            Some(id) => self.ctx.storage.get_service(id).await?,
            None => None,
        };
        let place = self.establishment(session.tenant_id.as_deref()).await?;
        let date = session
            .draft
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(labeled_date)
            .unwrap_or_default();
        let mut text = String::new();
        if let Some(prefix) = prefix {
            text.push_str(prefix);
            text.push('\n');
        }
        text.push_str(&format!(
            "Confira seu agendamento:\nServiço: {}\nProfissional: {}\nData: {}\nHorário: {}\nNome: {}\n\n1. Confirmar\n2. Cancelar\n3. Alterar meus dados",
            service
                .map(|s| format!("{} ({})", s.name, format_brl(s.price_cents)))
                .unwrap_or_default(),
            place.professional_name(),
            date,
            session.draft.time.as_deref().unwrap_or(""),
            session.draft.name.as_deref().unwrap_or(""),
        ));
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    async fn answer_confirmation(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let folded = turn.folded.as_str();
        if is_yes(folded) {
            return self.book(turn, session).await;
        }
        if is_no(folded) {
            return self.main_menu(turn, session, Some("Tudo bem, agendamento descartado.")).await;
        }
        if folded == "3" {
            session.state = DialogueState::AwaitingName;
            return Ok(Outcome::keep(session, turn.reply("Qual é o seu nome?")));
        }
        self.confirmation(turn, session, Some(INVALID)).await
    }

    async fn book(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        let storage = self.ctx.storage.as_ref();
        let draft = &session.draft;
        let client_id = session
            .user_id
            .clone()
            .or_else(|| turn.identity.account_id().map(str::to_string));
        let (Some(service_id), Some(date), Some(time), Some(professional), Some(client_id)) = (
            draft.service_id.clone(),
            draft.date.clone(),
            draft.time.clone(),
            session.tenant_id.clone(),
            client_id,
        ) else {
            warn!(address = %turn.address, "confirmation with incomplete draft");
            return Ok(Outcome::delete(turn.reply(RESTART)));
        };
        let Some(service) = storage.get_service(&service_id).await? else {
            warn!(address = %turn.address, service_id = %service_id, "draft references a missing service");
            return Ok(Outcome::delete(turn.reply(RESTART)));
        };
        // nothing fallible may run between the insert and the reply
        let client = storage.get_account(&client_id).await?;
        let place = self.establishment(Some(&professional)).await?;

        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: professional.clone(),
            client_id,
            service_id,
            date,
            time,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: self.ctx.clock.now().to_rfc3339(),
        };
        match self.ctx.ledger.book(&appointment).await {
            Ok(()) => {}
            Err(e) if e.is_slot_taken() => {
                info!(address = %turn.address, date = %appointment.date, time = %appointment.time, "slot taken at confirmation");
                return self.main_menu(turn, session, Some(SLOT_TAKEN)).await;
            }
            Err(e) => return Err(e),
        }

        let client_name = client
            .as_ref()
            .map(|c| c.display_name().to_string())
            .unwrap_or_default();
        let date_label = NaiveDate::parse_from_str(&appointment.date, "%Y-%m-%d")
            .map(labeled_date)
            .unwrap_or_else(|_| appointment.date.clone());
        let template = place
            .owner
            .as_ref()
            .and_then(|o| o.bot.confirmation_template.clone())
            .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string());
        let establishment = place.name(&self.ctx.config.agent.name);
        let barber = place.professional_name();
        let mut text = templates::render(
            &template,
            &[
                ("user_name", &client_name),
                ("service_name", &service.name),
                ("date", &date_label),
                ("time", &appointment.time),
                ("barber_name", &barber),
                ("establishment_name", &establishment),
            ],
        );
        if let Some(url) = self.payment_link(&appointment, &service, client.as_ref()).await {
            text.push_str(&format!("\n\nPagamento: {url}"));
        }

        let mut outcome = Outcome::delete(turn.reply(text));
        if let Some(pro) = &place.professional {
            outcome = outcome.and(OutboundMessage {
                address: pro.phone.clone(),
                text: format!(
                    "Novo agendamento: {client_name} - {} em {date_label} às {}.",
                    service.name, appointment.time
                ),
                tenant_id: place.owner_id().map(str::to_string),
            });
        }
        Ok(outcome)
    }

    async fn payment_link(
        &self,
        appointment: &Appointment,
        service: &Service,
        client: Option<&Account>,
    ) -> Option<String> {
        let (payments, client) = (self.ctx.payments.as_ref()?, client?);
        match payments.create_payment_link(appointment, service, client).await {
            Ok(link) => link,
            Err(e) => {
                warn!(appointment_id = %appointment.id, error = %e, "payment link unavailable");
                None
            }
        }
    }

    async fn manage_booking(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        let ids = session.metadata.appointment_ids.clone();
        let Some(idx) = parse_choice(&turn.text, ids.len()) else {
            if turn.folded.chars().all(|c| c.is_ascii_digit()) {
                return self.list_bookings(turn, session).await;
            }
            return self.assistant(turn, session).await;
        };
        let storage = self.ctx.storage.as_ref();
        let Some(appointment) = storage
            .get_appointment(&ids[idx])
            .await?
            .filter(Appointment::is_active_booking)
        else {
            return Ok(Outcome::delete(turn.reply("Esse agendamento já não está ativo.")));
        };
        storage
            .update_appointment_status(&appointment.id, AppointmentStatus::Cancelled, Some("cliente cancelou"))
            .await?;
        info!(address = %turn.address, appointment_id = %appointment.id, "client cancelled appointment");

        let when = format!("{} às {}", display_date(&appointment.date), appointment.time);
        let mut outcome = Outcome::delete(turn.reply(format!("Agendamento de {when} cancelado.")));
        let place = self.establishment(Some(&appointment.tenant_id)).await?;
        if let Some(pro) = &place.professional {
            let client = self.client_account(turn, &session).await?;
            let name = client.as_ref().map(|c| c.display_name().to_string()).unwrap_or_default();
            outcome = outcome.and(OutboundMessage {
                address: pro.phone.clone(),
                text: format!("Cancelamento: {name} cancelou o horário de {when}."),
                tenant_id: place.owner_id().map(str::to_string),
            });
        }
        Ok(outcome)
    }

    /// Critical states only accept their own answers and re-prompt on
    /// anything else; they never reach the assistant.
    async fn critical_step(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        match session.state {
            DialogueState::AwaitingProfessional => self.pick_professional(turn, session).await,
            DialogueState::AwaitingService => self.pick_service(turn, session).await,
            DialogueState::AwaitingDate => self.pick_date(turn, session).await,
            DialogueState::AwaitingTime => self.pick_time(turn, session).await,
            DialogueState::AwaitingName => Ok(self.capture_name(turn, session)),
            DialogueState::AwaitingEmail => self.capture_email(turn, session).await,
            DialogueState::AwaitingConfirmation => self.answer_confirmation(turn, session).await,
            _ => self.start(turn).await,
        }
    }

    async fn assistant(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        let nudge = self.ctx.config.dialogue.menu_nudge.clone();
        let place = self.establishment(session.tenant_id.as_deref()).await?;
        let tenant_id = place
            .owner_id()
            .map(str::to_string)
            .or_else(|| session.tenant_id.clone());
        let roster = match tenant_id.as_deref() {
            Some(t) => roster_accounts(self.ctx.storage.as_ref(), t)
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect(),
            None => Vec::new(),
        };
        let services = match session.tenant_id.as_deref() {
            Some(p) => services_offered(self.ctx.storage.as_ref(), p, tenant_id.as_deref()).await?,
            None => Vec::new(),
        };
        let client = self.client_account(turn, &session).await?;

        let establishment = place.name(&self.ctx.config.agent.name);
        let tone = place
            .owner
            .as_ref()
            .and_then(|o| o.bot.tone.clone())
            .unwrap_or_else(|| "cordial".to_string());
        let catalog: Vec<String> = services
            .iter()
            .map(|s| format!("- {} (id {}): {}, {} min", s.name, s.id, format_brl(s.price_cents), s.duration_minutes))
            .collect();
        let system_prompt = format!(
            "Você é o assistente virtual de {establishment}. Tom: {tone}. Responda em português, em poucas frases.\nServiços:\n{}",
            catalog.join("\n")
        );

        let scope = ToolScope {
            role: derive_role(client.as_ref(), false),
            tenant_id,
            calendar_id: session.tenant_id.clone(),
            roster,
            caller_account_id: client.as_ref().map(|c| c.id.clone()),
            caller_phone: turn.address.clone(),
        };
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
            Ok(reply) => with_menu_nudge(&reply, &nudge),
            Err(e) => {
                warn!(address = %turn.address, error = %e, "assistant unavailable");
                format!("Desculpe, não consegui responder agora. {nudge}")
            }
        };
        Ok(Outcome::keep(session, turn.reply(text)))
    }
}

fn service_prompt(services: &[Service], prefix: Option<&str>) -> String {
    let items: Vec<String> = services
        .iter()
        .map(|s| format!("{} - {}", s.name, format_brl(s.price_cents)))
        .collect();
    let heading = match prefix {
        Some(p) => format!("{p} Escolha o serviço:"),
        None => "Escolha o serviço:".to_string(),
    };
    format!("{heading}\n{}", numbered(&items))
}

fn date_prompt(dates: &[NaiveDate], prefix: Option<&str>) -> String {
    let items: Vec<String> = dates.iter().copied().map(labeled_date).collect();
    let heading = match prefix {
        Some(p) => format!("{p} Escolha a data:"),
        None => "Escolha a data:".to_string(),
    };
    format!("{heading}\n{}", numbered(&items))
}

#[async_trait]
impl PersonaMachine for ClientMachine {
    async fn start(&self, turn: &Turn) -> Result<Outcome, AgendoError> {
        let mut session = turn.new_session(DialogueState::MainMenu);
        session.metadata = SessionMetadata::default();
        let storage = self.ctx.storage.as_ref();

        let Some(tenant) = turn.identity.tenant_id.clone() else {
            let tenants = storage.list_tenants().await?;
            if tenants.is_empty() {
                return Ok(Outcome::delete(
                    turn.reply("Ainda não há estabelecimentos disponíveis para agendamento."),
                ));
            }
            session.tenant_id = None;
            return Ok(self.chooser(turn, session, &tenants, "Com qual estabelecimento você quer falar?"));
        };

        let roster = roster_accounts(storage, &tenant).await?;
        session.tenant_id = Some(tenant);
        if roster.len() > 1 {
            return Ok(self.chooser(turn, session, &roster, "Com qual profissional você quer agendar?"));
        }
        self.main_menu(turn, session, None).await
    }

    async fn step(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        debug!(address = %turn.address, state = %session.state, "client step");
        if session.state.is_critical() {
            return self.critical_step(turn, session).await;
        }
        match session.state {
            DialogueState::MainMenu => self.main_menu_choice(turn, session).await,
            DialogueState::ManagingAppointments => self.manage_booking(turn, session).await,
            DialogueState::AiChat => {
                if matches!(turn.folded.as_str(), "1" | "2" | "3") {
                    self.main_menu_choice(turn, session).await
                } else {
                    self.assistant(turn, session).await
                }
            }
            _ => self.start(turn).await,
        }
    }
}
