// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Professional onboarding.
//!
//! niche → plan → establishment name → services → email → connection
//! instructions. The owner account, its services and default working hours
//! are written when the email is accepted.

use std::sync::Arc;

use agendo_core::{
    Account, AccountRole, AgendoError, BotPersona, ChatMessage, CompletionRequest, DialogueState,
    ParsedService, Service, Session, SubscriptionStatus,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::context::EngineContext;
use crate::session::{Outcome, PersonaMachine, Turn};
use crate::templates::{format_brl, numbered, parse_choice};

const OTHER_NICHE: &str = "Outro";

const SERVICES_PROMPT: &str = r#"Extraia os serviços e preços do texto do profissional.
Responda APENAS com um array JSON no formato [{"name":"Corte","price":45.0}], sem texto extra.
Se não houver serviços com preço, responda []."#;

#[derive(Deserialize)]
struct RawService {
    name: String,
    price: RawPrice,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn cents(&self) -> Option<i64> {
        let value = match self {
            RawPrice::Number(n) => *n,
            RawPrice::Text(s) => decimal_text(s).parse::<f64>().ok()?,
        };
        (value.is_finite() && value >= 0.0).then(|| (value * 100.0).round() as i64)
    }
}

/// Rewrites a BRL amount (`R$ 1.234,56`, `30,5`, `45.00`) with `.` as the
/// only decimal separator.
fn decimal_text(raw: &str) -> String {
    let amount = raw.trim().trim_start_matches("R$").trim();
    if amount.contains(',') {
        return amount.replace('.', "").replace(',', ".");
    }
    // without a comma, a dot followed by exactly three digits groups thousands
    let thousands = amount
        .rsplit_once('.')
        .is_some_and(|(_, tail)| tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()));
    if thousands {
        amount.replace('.', "")
    } else {
        amount.to_string()
    }
}

/// Parses the model's service list. `None` when the reply holds no usable
/// entries.
pub fn parse_services(reply: &str) -> Option<Vec<ParsedService>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    let raw: Vec<RawService> = serde_json::from_str(&reply[start..=end]).ok()?;
    let services: Vec<ParsedService> = raw
        .into_iter()
        .filter_map(|s| {
            let name = s.name.trim().to_string();
            let price_cents = s.price.cents()?;
            (!name.is_empty()).then_some(ParsedService { name, price_cents })
        })
        .collect();
    (!services.is_empty()).then_some(services)
}

/// Bot tone for a business niche.
fn tone_for(niche: &str) -> &'static str {
    let niche = agendo_core::text::fold(niche);
    if niche.contains("barb") {
        "descontraído"
    } else if niche.contains("salao") || niche.contains("estetica") || niche.contains("manicure") {
        "acolhedor"
    } else {
        "cordial"
    }
}

pub struct RegistrationMachine {
    ctx: Arc<EngineContext>,
}

impl RegistrationMachine {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    fn niche_options(&self) -> Vec<String> {
        let mut options = self.ctx.config.registration.niches.clone();
        options.push(OTHER_NICHE.to_string());
        options
    }

    fn niche_prompt(&self, prefix: &str) -> String {
        format!("{prefix}Qual é o segmento do seu negócio?\n{}", numbered(&self.niche_options()))
    }

    fn plan_prompt(&self, prefix: &str) -> String {
        let plans: Vec<String> = self
            .ctx
            .config
            .registration
            .plans
            .iter()
            .map(|p| format!("{} - {}/mês", p.name, format_brl(p.monthly_price_cents)))
            .collect();
        format!("{prefix}Escolha seu plano:\n{}", numbered(&plans))
    }

    fn to_plan(&self, turn: &Turn, mut session: Session, niche: String) -> Outcome {
        session.draft.niche = Some(niche);
        session.state = DialogueState::RegAwaitingPlan;
        Outcome::keep(session, turn.reply(self.plan_prompt("")))
    }

    fn pick_niche(&self, turn: &Turn, mut session: Session) -> Outcome {
        let options = self.niche_options();
        match parse_choice(&turn.text, options.len()) {
            Some(idx) if idx + 1 == options.len() => {
                session.state = DialogueState::RegAwaitingNicheOther;
                Outcome::keep(session, turn.reply("Qual é o segmento do seu negócio?"))
            }
            Some(idx) => self.to_plan(turn, session, options[idx].clone()),
            None => Outcome::keep(session, turn.reply(self.niche_prompt("Opção inválida. "))),
        }
    }

    fn capture_niche(&self, turn: &Turn, session: Session) -> Outcome {
        let niche = turn.text.trim();
        if niche.chars().count() < 2 {
            return Outcome::keep(session, turn.reply("Descreva o segmento do seu negócio."));
        }
        self.to_plan(turn, session, niche.to_string())
    }

    fn pick_plan(&self, turn: &Turn, mut session: Session) -> Outcome {
        let plans = &self.ctx.config.registration.plans;
        let Some(idx) = parse_choice(&turn.text, plans.len()) else {
            return Outcome::keep(session, turn.reply(self.plan_prompt("Opção inválida. ")));
        };
        session.draft.plan = Some(plans[idx].name.clone());
        session.state = DialogueState::RegAwaitingName;
        Outcome::keep(session, turn.reply("Qual é o nome do seu estabelecimento?"))
    }

    fn capture_name(&self, turn: &Turn, mut session: Session) -> Outcome {
        let name = turn.text.trim();
        if name.chars().count() < 2 {
            return Outcome::keep(
                session,
                turn.reply("Informe o nome do estabelecimento (mínimo 2 letras)."),
            );
        }
        session.draft.establishment_name = Some(name.to_string());
        session.state = DialogueState::RegAwaitingServices;
        Outcome::keep(
            session,
            turn.reply("Quais serviços você oferece e quanto custam? Ex.: Corte 45, Barba 30"),
        )
    }

    async fn extract_services(&self, text: &str) -> Option<Vec<ParsedService>> {
        let request = CompletionRequest {
            system_prompt: SERVICES_PROMPT.to_string(),
            messages: vec![ChatMessage::user(text)],
            tools: None,
            max_tokens: Some(512),
            temperature: Some(0.0),
        };
        match self.ctx.provider.complete(request).await {
            Ok(response) => {
                let parsed = parse_services(&response.text);
                if parsed.is_none() {
                    warn!(reply_len = response.text.len(), "service list not understood");
                }
                parsed
            }
            Err(e) => {
                warn!(error = %e, "service extraction failed");
                None
            }
        }
    }

    async fn capture_services(&self, turn: &Turn, mut session: Session) -> Outcome {
        let text = turn.text.trim();
        let summary = match self.extract_services(text).await {
            Some(services) => {
                let lines: Vec<String> = services
                    .iter()
                    .map(|s| format!("- {}: {}", s.name, format_brl(s.price_cents)))
                    .collect();
                session.draft.services = services;
                session.draft.raw_services = None;
                format!("Anotei seus serviços:\n{}", lines.join("\n"))
            }
            None => {
                session.draft.services.clear();
                session.draft.raw_services = Some(text.to_string());
                "Anotei seus serviços. Você poderá ajustá-los depois no painel.".to_string()
            }
        };
        session.state = DialogueState::RegAwaitingEmail;
        Outcome::keep(session, turn.reply(format!("{summary}\n\nQual é o seu e-mail?")))
    }

    async fn capture_email(&self, turn: &Turn, mut session: Session) -> Result<Outcome, AgendoError> {
        let email = turn.text.trim().to_lowercase();
        if !email.contains('@') || email.contains(char::is_whitespace) {
            return Ok(Outcome::keep(
                session,
                turn.reply("E-mail inválido. Informe um e-mail como nome@exemplo.com"),
            ));
        }
        let storage = self.ctx.storage.as_ref();
        if storage.find_account_by_email(&email).await?.is_some() {
            return Ok(Outcome::keep(
                session,
                turn.reply("Esse e-mail já está cadastrado. Informe outro e-mail."),
            ));
        }

        let draft = &session.draft;
        let establishment = draft
            .establishment_name
            .clone()
            .unwrap_or_else(|| turn.address.clone());
        let niche = draft.niche.clone().unwrap_or_default();
        let owner = Account {
            id: uuid::Uuid::new_v4().to_string(),
            phone: turn.address.clone(),
            name: Some(establishment.clone()),
            email: Some(email.clone()),
            role: AccountRole::Owner,
            owner_id: None,
            niche: draft.niche.clone(),
            plan: draft.plan.clone(),
            subscription_status: SubscriptionStatus::Trial,
            bot: BotPersona {
                name: Some(establishment.clone()),
                tone: Some(tone_for(&niche).to_string()),
                greeting_template: None,
                confirmation_template: None,
            },
            initial_services: draft.raw_services.clone(),
            created_at: self.ctx.clock.now().to_rfc3339(),
        };
        storage.upsert_account(&owner).await?;

        let services: Vec<Service> = draft
            .services
            .iter()
            .map(|s| Service {
                id: uuid::Uuid::new_v4().to_string(),
                tenant_id: owner.id.clone(),
                name: s.name.clone(),
                price_cents: s.price_cents,
                duration_minutes: self.ctx.config.scheduling.slot_minutes,
            })
            .collect();
        if !services.is_empty() {
            storage.insert_services(&services).await?;
        }
        storage
            .set_availability(&owner.id, &self.ctx.ledger.default_hours())
            .await?;
        info!(
            tenant_id = %owner.id,
            services = services.len(),
            raw_services = owner.initial_services.is_some(),
            "tenant registered"
        );

        let plan = session.draft.plan.clone().unwrap_or_default();
        session.user_id = Some(owner.id.clone());
        session.tenant_id = Some(owner.id.clone());
        session.draft.email = Some(email);
        session.state = DialogueState::RegAwaitingReady;
        let text = format!(
            "Cadastro concluído! {establishment} está em período de teste no plano {plan}.\n\n{}\n\nResponda *pronto* quando terminar.",
            self.ctx.config.registration.connect_instructions
        );
        Ok(Outcome::keep(session, turn.reply(text)))
    }

    fn finish(&self, turn: &Turn, session: Session) -> Outcome {
        if matches!(turn.folded.as_str(), "pronto" | "ok" | "1") {
            info!(address = %turn.address, "onboarding finished");
            return Outcome::delete(
                turn.reply("Tudo certo! A partir de agora, envie *menu* para acessar seu painel."),
            );
        }
        Outcome::keep(session, turn.reply("Quando terminar de conectar, responda *pronto*."))
    }
}

#[async_trait]
impl PersonaMachine for RegistrationMachine {
    async fn start(&self, turn: &Turn) -> Result<Outcome, AgendoError> {
        let mut session = Session::new(turn.address.clone(), DialogueState::RegAwaitingNiche);
        session.updated_at = self.ctx.clock.now().to_rfc3339();
        info!(address = %turn.address, "onboarding started");
        let prefix = format!(
            "Que ótimo! Vamos cadastrar seu negócio no {}.\n\n",
            self.ctx.config.agent.name
        );
        Ok(Outcome::keep(session, turn.reply(self.niche_prompt(&prefix))))
    }

    async fn step(&self, turn: &Turn, session: Session) -> Result<Outcome, AgendoError> {
        debug!(address = %turn.address, state = %session.state, "registration step");
        match session.state {
            DialogueState::RegAwaitingNiche => Ok(self.pick_niche(turn, session)),
            DialogueState::RegAwaitingNicheOther => Ok(self.capture_niche(turn, session)),
            DialogueState::RegAwaitingPlan => Ok(self.pick_plan(turn, session)),
            DialogueState::RegAwaitingName => Ok(self.capture_name(turn, session)),
            DialogueState::RegAwaitingServices => Ok(self.capture_services(turn, session).await),
            DialogueState::RegAwaitingEmail => self.capture_email(turn, session).await,
            DialogueState::RegAwaitingReady => Ok(self.finish(turn, session)),
            _ => self.start(turn).await,
        }
    }
}
