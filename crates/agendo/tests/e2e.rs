// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end dialogue tests driving the engine with mock adapters.

use agendo_core::{
    AccountRole, AppointmentStatus, ChatRole, DialogueState, PaymentStatus, Session, StateFamily,
    StorageAdapter, SubscriptionStatus,
};
use agendo_test_utils::TestHarness;
use chrono::NaiveDate;
use strum::IntoEnumIterator;

const OWNER: &str = "5511900000001";
const ANA: &str = "5511911110001";
const BRUNO: &str = "5511922220002";
const GUEST: &str = "5511933330003";

/// A single-professional shop with one priced service and a known client.
async fn shop() -> TestHarness {
    let h = TestHarness::new().await.unwrap();
    h.seed_owner("t1", OWNER, "Barbearia Central").await.unwrap();
    h.seed_service("s1", "t1", "Corte Social", 4500).await.unwrap();
    h.seed_client("c1", ANA, "Ana").await.unwrap();
    h
}

/// Walks a named client from the main menu to the confirmation summary of
/// Tuesday 03/06 at 14:00.
async fn reach_confirmation(h: &TestHarness, address: &str) -> String {
    h.reply(address, "oi").await;
    h.reply(address, "1").await;
    h.reply(address, "1").await;
    h.reply(address, "1").await;
    h.reply(address, "6").await
}

#[tokio::test]
async fn guest_picks_professional_from_roster() {
    let h = TestHarness::new().await.unwrap();
    h.seed_owner("t1", OWNER, "Barbearia Central").await.unwrap();
    h.seed_staff("st1", "5511900000002", "João", "t1").await.unwrap();
    h.seed_staff("st2", "5511900000003", "Pedro", "t1").await.unwrap();
    h.seed_staff("st3", "5511900000004", "Lucas", "t1").await.unwrap();

    let text = h.reply(GUEST, "oi").await;
    assert!(text.starts_with("Com qual profissional você quer agendar?"), "{text}");
    for option in ["1. Barbearia Central", "2. João", "3. Pedro", "4. Lucas"] {
        assert!(text.contains(option), "missing {option} in {text}");
    }
    let session = h.session(GUEST).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::AwaitingProfessional);

    let text = h.reply(GUEST, "2").await;
    assert!(text.contains("Olá! Bem-vindo(a) à Barbearia Central."), "{text}");
    assert!(text.contains("Como posso ajudar?"), "{text}");
    let session = h.session(GUEST).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::MainMenu);
    assert_eq!(session.tenant_id.as_deref(), Some("st1"));
}

#[tokio::test]
async fn known_client_reaches_confirmation() {
    let h = shop().await;

    let text = h.reply(ANA, "oi").await;
    assert!(text.starts_with("Olá, Ana! Bem-vindo(a) à Barbearia Central."), "{text}");
    assert!(text.contains("1. Agendar horário"));

    let text = h.reply(ANA, "1").await;
    assert_eq!(text, "Escolha o serviço:\n1. Corte Social - R$ 45,00");

    let text = h.reply(ANA, "1").await;
    assert!(text.starts_with("Escolha a data:\n1. Ter 03/06"), "{text}");

    let text = h.reply(ANA, "1").await;
    assert!(text.starts_with("Horários livres em Ter 03/06:\n1. 09:00"), "{text}");

    let text = h.reply(ANA, "6").await;
    assert!(text.starts_with("Confira seu agendamento:"), "{text}");
    assert!(text.contains("Serviço: Corte Social (R$ 45,00)"));
    assert!(text.contains("Profissional: Barbearia Central"));
    assert!(text.contains("Data: Ter 03/06"));
    assert!(text.contains("Horário: 14:00"));
    assert!(text.contains("Nome: Ana"));

    let session = h.session(ANA).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::AwaitingConfirmation);
    assert_eq!(session.draft.time.as_deref(), Some("14:00"));
    assert_eq!(session.draft.date.as_deref(), Some("2025-06-03"));
}

#[tokio::test]
async fn guest_booking_asks_for_name_and_email() {
    let h = shop().await;
    h.reply(GUEST, "oi").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;

    assert_eq!(h.reply(GUEST, "2").await, "Qual é o seu nome?");
    assert_eq!(h.reply(GUEST, "Carla").await, "Qual é o seu e-mail?");
    let text = h.reply(GUEST, "carla@example.com").await;
    assert!(text.contains("Nome: Carla"), "{text}");
    assert!(text.contains("Horário: 10:00"), "{text}");

    let text = h.reply(GUEST, "1").await;
    assert!(text.starts_with("Agendamento registrado! ✅"), "{text}");
    let account = h.storage.find_account_by_phone(GUEST).await.unwrap().unwrap();
    assert_eq!(account.name.as_deref(), Some("Carla"));
    assert_eq!(account.email.as_deref(), Some("carla@example.com"));
}

#[tokio::test]
async fn confirmed_booking_sends_payment_link_and_notifies_professional() {
    let h = TestHarness::builder().with_payments().build().await.unwrap();
    h.seed_owner("t1", OWNER, "Barbearia Central").await.unwrap();
    h.seed_service("s1", "t1", "Corte Social", 4500).await.unwrap();
    h.seed_client("c1", ANA, "Ana").await.unwrap();

    reach_confirmation(&h, ANA).await;
    let sent = h.send(ANA, "1").await;

    let to_client: Vec<_> = sent.iter().filter(|m| m.address == ANA).collect();
    assert_eq!(to_client.len(), 1);
    let text = &to_client[0].text;
    assert!(text.starts_with("Agendamento registrado! ✅\nCorte Social com Barbearia Central"), "{text}");
    assert!(text.contains("Pagamento: https://pay.test/"), "{text}");

    let to_owner: Vec<_> = sent.iter().filter(|m| m.address == OWNER).collect();
    assert_eq!(to_owner.len(), 1);
    assert!(to_owner[0].text.starts_with("Novo agendamento: Ana - Corte Social"));
    assert!(to_owner[0].text.contains("às 14:00"));

    assert!(h.session(ANA).await.unwrap().is_none());
    let rows = h.appointments("t1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2025-06-03");
    assert_eq!(rows[0].time, "14:00");
    assert_eq!(rows[0].status, AppointmentStatus::Pending);
    assert_eq!(h.payments.as_ref().unwrap().links().await.len(), 1);
}

#[tokio::test]
async fn second_confirmation_of_same_slot_loses() {
    let h = shop().await;
    h.seed_client("c2", BRUNO, "Bruno").await.unwrap();

    reach_confirmation(&h, ANA).await;
    let text = reach_confirmation(&h, BRUNO).await;
    assert!(text.contains("Horário: 14:00"), "{text}");

    let first = h.reply(ANA, "1").await;
    assert!(first.starts_with("Agendamento registrado!"), "{first}");

    let second = h.reply(BRUNO, "1").await;
    assert!(
        second.starts_with("Que pena, horário já ocupado! Alguém reservou antes de você."),
        "{second}"
    );
    assert!(second.contains("Como posso ajudar?"));
    let session = h.session(BRUNO).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::MainMenu);

    let rows: Vec<_> = h
        .appointments("t1")
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.date == "2025-06-03" && a.time == "14:00" && a.occupies_slot())
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].client_id, "c1");
}

#[tokio::test]
async fn client_cancels_booking_from_list() {
    let h = shop().await;
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-04", "11:00").await.unwrap();

    h.reply(ANA, "oi").await;
    let text = h.reply(ANA, "2").await;
    assert!(text.starts_with("Seus agendamentos:"), "{text}");
    assert!(text.contains("11:00"));

    let sent = h.send(ANA, "1").await;
    assert!(sent.iter().any(|m| m.address == ANA && m.text.contains("cancelado")));
    assert!(
        sent.iter()
            .any(|m| m.address == OWNER && m.text.starts_with("Cancelamento: Ana"))
    );

    let row = h.storage.get_appointment("a1").await.unwrap().unwrap();
    assert_eq!(row.status, AppointmentStatus::Cancelled);
    assert_eq!(row.cancel_reason.as_deref(), Some("cliente cancelou"));
}

#[tokio::test]
async fn owner_cancels_next_booking_through_intent() {
    let h = shop().await;
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-02", "15:00").await.unwrap();

    let text = h.reply(OWNER, "oi").await;
    assert!(text.starts_with("Olá, Barbearia Central! Painel de Barbearia Central:"), "{text}");

    h.provider.add_text(r#"{"intent":"cancel_next","count":1}"#).await;
    let sent = h.send(OWNER, "cancelar meu próximo horário").await;

    let reply = sent.iter().find(|m| m.address == OWNER).unwrap();
    assert!(reply.text.starts_with("Cancelado(s) 1 agendamento(s):"), "{}", reply.text);
    assert!(reply.text.contains("- 02/06 às 15:00 Ana"));

    let notice = sent.iter().find(|m| m.address == ANA).unwrap();
    assert!(notice.text.starts_with("Olá, Ana!"), "{}", notice.text);
    assert!(notice.text.contains("Motivo: imprevisto na agenda"));

    let row = h.storage.get_appointment("a1").await.unwrap().unwrap();
    assert_eq!(row.status, AppointmentStatus::Cancelled);
    assert_eq!(row.cancel_reason.as_deref(), Some("imprevisto na agenda"));

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].system_prompt.contains("O gestor escolheu"));
}

#[tokio::test]
async fn owner_confirms_from_awaiting_state() {
    let h = shop().await;
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-02", "15:00").await.unwrap();

    h.reply(OWNER, "oi").await;
    h.reply(OWNER, "2").await;
    assert_eq!(
        h.session(OWNER).await.unwrap().unwrap().state,
        DialogueState::AdminAwaitingConfirm
    );

    h.provider
        .add_text(r#"{"intent":"confirm_appointment","client_name":"Ana","time":"15:00"}"#)
        .await;
    let sent = h.send(OWNER, "Ana 15h").await;

    assert!(
        sent.iter()
            .any(|m| m.address == ANA && m.text.contains("está confirmado"))
    );
    let row = h.storage.get_appointment("a1").await.unwrap().unwrap();
    assert_eq!(row.status, AppointmentStatus::Confirmed);

    let requests = h.provider.requests().await;
    assert!(
        requests[0]
            .system_prompt
            .contains("O gestor escolheu a ação: confirm_appointment.")
    );
}

#[tokio::test]
async fn owner_blocks_whole_day() {
    let h = shop().await;
    h.reply(OWNER, "oi").await;
    h.reply(OWNER, "5").await;

    h.provider.add_text(r#"{"intent":"block_day","date":"2025-06-10"}"#).await;
    let text = h.reply(OWNER, "dia 10").await;
    assert_eq!(text, "Bloqueei 9 horário(s) em 10/06.");

    let tuesday = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
    let free = h.engine.context().ledger.free_slots("t1", tuesday).await.unwrap();
    assert!(free.is_empty());
}

#[tokio::test]
async fn unreadable_intent_keeps_state() {
    let h = shop().await;
    h.reply(OWNER, "oi").await;
    h.reply(OWNER, "3").await;

    h.provider.add_text("não sei").await;
    let text = h.reply(OWNER, "aquele cliente").await;
    assert!(text.starts_with("Não entendi o pedido."), "{text}");
    assert_eq!(
        h.session(OWNER).await.unwrap().unwrap().state,
        DialogueState::AdminAwaitingPaid
    );
}

#[tokio::test]
async fn registration_stores_raw_services_when_unparsed() {
    let h = TestHarness::new().await.unwrap();

    let text = h.reply(GUEST, "quero cadastrar meu negócio").await;
    assert!(text.starts_with("Que ótimo! Vamos cadastrar seu negócio"), "{text}");
    assert!(text.contains("1. Barbearia"));

    let text = h.reply(GUEST, "1").await;
    assert!(text.starts_with("Escolha seu plano:"), "{text}");
    assert_eq!(h.reply(GUEST, "1").await, "Qual é o nome do seu estabelecimento?");
    let text = h.reply(GUEST, "Barbearia do Zé").await;
    assert!(text.starts_with("Quais serviços você oferece"), "{text}");

    h.provider.add_text("Não consegui identificar os preços.").await;
    let text = h.reply(GUEST, "um corte bom e rápido").await;
    assert!(
        text.starts_with("Anotei seus serviços. Você poderá ajustá-los depois no painel."),
        "{text}"
    );
    assert!(text.ends_with("Qual é o seu e-mail?"));
    let session = h.session(GUEST).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::RegAwaitingEmail);

    let text = h.reply(GUEST, "ze@barbearia.com").await;
    assert!(text.starts_with("Cadastro concluído!"), "{text}");
    let session = h.session(GUEST).await.unwrap().unwrap();
    assert_eq!(session.state, DialogueState::RegAwaitingReady);

    let owner = h
        .storage
        .find_account_by_email("ze@barbearia.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.role, AccountRole::Owner);
    assert_eq!(owner.phone, GUEST);
    assert_eq!(owner.name.as_deref(), Some("Barbearia do Zé"));
    assert_eq!(owner.niche.as_deref(), Some("Barbearia"));
    assert_eq!(owner.subscription_status, SubscriptionStatus::Trial);
    assert_eq!(owner.initial_services.as_deref(), Some("um corte bom e rápido"));

    h.reply(GUEST, "pronto").await;
    assert!(h.session(GUEST).await.unwrap().is_none());
    let text = h.reply(GUEST, "oi").await;
    assert!(text.contains("Painel de Barbearia do Zé"), "{text}");
}

#[tokio::test]
async fn registration_inserts_parsed_services() {
    let h = TestHarness::new().await.unwrap();
    h.reply(GUEST, "quero cadastrar meu negócio").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "2").await;
    h.reply(GUEST, "Studio Lima").await;

    h.provider
        .add_text(r#"[{"name":"Corte","price":45},{"name":"Barba","price":30}]"#)
        .await;
    let text = h.reply(GUEST, "Corte 45, Barba 30").await;
    assert!(text.starts_with("Anotei seus serviços:\n- Corte"), "{text}");

    h.reply(GUEST, "lima@studio.com").await;
    let owner = h.storage.find_account_by_phone(GUEST).await.unwrap().unwrap();
    let services = h.storage.list_services(&owner.id).await.unwrap();
    let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Corte"));
    assert!(names.contains(&"Barba"));
    assert!(h.storage.get_availability(&owner.id).await.unwrap().is_some());
}

#[tokio::test]
async fn registration_rejects_known_email() {
    let h = shop().await;
    let mut owner = h.storage.get_account("t1").await.unwrap().unwrap();
    owner.email = Some("dono@central.com".to_string());
    h.storage.upsert_account(&owner).await.unwrap();

    h.reply(GUEST, "quero cadastrar meu negócio").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "Outra Barbearia").await;
    h.provider.add_text("sem lista").await;
    h.reply(GUEST, "corte").await;

    let text = h.reply(GUEST, "dono@central.com").await;
    assert!(text.starts_with("Esse e-mail já está cadastrado"), "{text}");
    assert_eq!(
        h.session(GUEST).await.unwrap().unwrap().state,
        DialogueState::RegAwaitingEmail
    );
}

#[tokio::test]
async fn menu_resets_from_every_state() {
    let h = shop().await;

    for state in DialogueState::iter() {
        let (address, expected) = match state.family() {
            StateFamily::Management => (OWNER, DialogueState::AdminMenu),
            StateFamily::Client | StateFamily::Registration => (ANA, DialogueState::MainMenu),
        };
        let mut session = Session::new(address, state);
        session.tenant_id = Some("t1".to_string());
        h.storage.put_session(&session).await.unwrap();

        let text = h.reply(address, "menu").await;
        assert!(!text.contains("tive um problema"), "{state}: {text}");
        assert!(!text.contains("Não consegui concluir"), "{state}: {text}");
        let after = h.session(address).await.unwrap().unwrap();
        assert_eq!(after.state, expected, "reset from {state}");
    }
    assert_eq!(h.provider.request_count().await, 0);
}

#[tokio::test]
async fn client_assistant_cannot_mark_paid() {
    let h = shop().await;
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-04", "11:00").await.unwrap();

    h.reply(ANA, "oi").await;
    h.reply(ANA, "3").await;
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::AiChat);

    h.provider
        .add_tool_call("mark_paid", serde_json::json!({ "appointment_id": "a1" }))
        .await;
    h.provider.add_text("Não posso registrar pagamentos.").await;
    let text = h.reply(ANA, "marque meu horário como pago").await;
    assert!(text.starts_with("Não posso registrar pagamentos."), "{text}");

    let row = h.storage.get_appointment("a1").await.unwrap().unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Pending);

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 2);
    let offered: Vec<_> = requests[0]
        .tools
        .iter()
        .flatten()
        .map(|t| t.name.as_str())
        .collect();
    for forbidden in ["mark_paid", "confirm_appointment", "list_staff", "add_staff", "list_tenants"] {
        assert!(!offered.contains(&forbidden), "{forbidden} offered to a client");
    }
    let tool_msg = requests[1]
        .messages
        .iter()
        .find(|m| m.role == ChatRole::Tool)
        .unwrap();
    assert!(tool_msg.content.contains("not available"));
    assert!(requests[1].tools.is_none());
}

#[tokio::test]
async fn assistant_failure_apologizes() {
    let h = shop().await;
    h.reply(ANA, "oi").await;
    h.reply(ANA, "3").await;

    h.provider.add_failure("upstream down").await;
    let text = h.reply(ANA, "quais serviços vocês têm?").await;
    assert!(text.starts_with("Desculpe, não consegui responder agora."), "{text}");
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::AiChat);
}

#[tokio::test]
async fn free_slots_respect_lead_time_today() {
    let h = shop().await;
    let ledger = &h.engine.context().ledger;

    let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    let free = ledger.free_slots("t1", today).await.unwrap();
    assert_eq!(free.first().map(String::as_str), Some("10:00"));
    assert!(!free.contains(&"09:00".to_string()));

    let tomorrow = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
    let free = ledger.free_slots("t1", tomorrow).await.unwrap();
    assert_eq!(free.len(), 9);
    assert_eq!(free.first().map(String::as_str), Some("09:00"));
    assert_eq!(free.last().map(String::as_str), Some("17:00"));

    let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
    assert!(ledger.free_slots("t1", sunday).await.unwrap().is_empty());

    let dates = ledger.booking_dates();
    assert_eq!(dates.first(), Some(&tomorrow));
}

#[tokio::test]
async fn cancel_next_keeps_going_after_one_failure() {
    let h = shop().await;
    h.seed_client("c2", BRUNO, "Bruno").await.unwrap();
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-02", "15:00").await.unwrap();
    h.seed_appointment("a2", "t1", "c2", "s1", "2025-06-02", "16:00").await.unwrap();
    h.reply(OWNER, "oi").await;

    h.faults.fail("update_appointment_status", Some("a1"));
    h.provider.add_text(r#"{"intent":"cancel_next","count":2}"#).await;
    let sent = h.send(OWNER, "cancelar os dois próximos").await;

    let reply = sent.iter().find(|m| m.address == OWNER).unwrap();
    assert!(
        reply.text.starts_with("Cancelado(s) 1 agendamento(s):\n- 02/06 às 16:00 Bruno"),
        "{}",
        reply.text
    );
    assert!(
        reply.text.ends_with("Não consegui cancelar 1 agendamento(s). Tente novamente."),
        "{}",
        reply.text
    );
    assert!(sent.iter().any(|m| m.address == BRUNO && m.text.contains("Motivo:")));
    assert!(!sent.iter().any(|m| m.address == ANA));

    h.faults.heal();
    let a1 = h.storage.get_appointment("a1").await.unwrap().unwrap();
    assert_eq!(a1.status, AppointmentStatus::Pending);
    let a2 = h.storage.get_appointment("a2").await.unwrap().unwrap();
    assert_eq!(a2.status, AppointmentStatus::Cancelled);
    assert_eq!(
        h.session(OWNER).await.unwrap().unwrap().state,
        DialogueState::AdminMenu
    );
}

#[tokio::test]
async fn failed_lookup_at_confirmation_books_nothing() {
    let h = shop().await;
    reach_confirmation(&h, ANA).await;

    h.faults.fail_once("get_account", Some("c1"));
    let text = h.reply(ANA, "1").await;
    assert!(text.starts_with("Desculpe, tive um problema por aqui."), "{text}");
    assert!(h.appointments("t1").await.unwrap().is_empty());
    assert_eq!(
        h.session(ANA).await.unwrap().unwrap().state,
        DialogueState::AwaitingConfirmation
    );

    let text = h.reply(ANA, "1").await;
    assert!(text.starts_with("Agendamento registrado!"), "{text}");
    assert_eq!(h.appointments("t1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn booking_steps_reprompt_free_text_without_the_assistant() {
    let h = shop().await;
    h.reply(ANA, "oi").await;
    h.reply(ANA, "1").await;

    let text = h.reply(ANA, "amanhã").await;
    assert!(text.starts_with("Opção inválida. Escolha o serviço:"), "{text}");
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::AwaitingService);

    h.reply(ANA, "1").await;
    let text = h.reply(ANA, "amanhã").await;
    assert!(text.starts_with("Opção inválida. Escolha a data:"), "{text}");
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::AwaitingDate);

    h.reply(ANA, "1").await;
    let text = h.reply(ANA, "amanhã").await;
    assert!(text.starts_with("Opção inválida. Escolha um horário:"), "{text}");
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::AwaitingTime);

    let text = h.reply(ANA, "talvez").await;
    assert!(text.starts_with("Opção inválida. Escolha um horário:"), "{text}");
    h.reply(ANA, "6").await;
    let text = h.reply(ANA, "pode ser").await;
    assert!(text.starts_with("Opção inválida."), "{text}");
    assert!(text.contains("Confira seu agendamento:"));
    assert_eq!(
        h.session(ANA).await.unwrap().unwrap().state,
        DialogueState::AwaitingConfirmation
    );

    assert_eq!(h.provider.request_count().await, 0);
}

#[tokio::test]
async fn menu_free_text_goes_to_assistant_with_nudge() {
    let h = shop().await;
    h.seed_appointment("a1", "t1", "c1", "s1", "2025-06-04", "11:00").await.unwrap();
    h.reply(ANA, "oi").await;

    h.provider.add_text("O corte social custa R$ 45,00.").await;
    let text = h.reply(ANA, "quanto custa o corte?").await;
    assert!(text.starts_with("O corte social custa R$ 45,00."), "{text}");
    assert!(text.ends_with("Digite *menu* para ver as opções."), "{text}");
    assert_eq!(h.session(ANA).await.unwrap().unwrap().state, DialogueState::MainMenu);

    h.reply(ANA, "2").await;
    assert_eq!(
        h.session(ANA).await.unwrap().unwrap().state,
        DialogueState::ManagingAppointments
    );
    h.provider.add_text("Seu horário é quarta às 11:00.").await;
    let text = h.reply(ANA, "que dia é meu horário?").await;
    assert!(text.starts_with("Seu horário é quarta às 11:00."), "{text}");
    assert!(text.ends_with("Digite *menu* para ver as opções."), "{text}");
    assert_eq!(
        h.session(ANA).await.unwrap().unwrap().state,
        DialogueState::ManagingAppointments
    );
    assert_eq!(h.provider.request_count().await, 2);
}

#[tokio::test]
async fn guest_short_name_and_bad_email_reprompt() {
    let h = shop().await;
    h.reply(GUEST, "oi").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "2").await;

    assert_eq!(
        h.reply(GUEST, "C").await,
        "Por favor, informe seu nome (mínimo 2 letras)."
    );
    assert_eq!(h.session(GUEST).await.unwrap().unwrap().state, DialogueState::AwaitingName);

    h.reply(GUEST, "Carla").await;
    for bad in ["carla@exemplo", "carla exemplo.com", "carla.exemplo.com"] {
        assert_eq!(
            h.reply(GUEST, bad).await,
            "E-mail inválido. Informe um e-mail como nome@exemplo.com",
            "{bad}"
        );
        assert_eq!(
            h.session(GUEST).await.unwrap().unwrap().state,
            DialogueState::AwaitingEmail
        );
    }
    let account = h.storage.find_account_by_phone(GUEST).await.unwrap().unwrap();
    assert!(account.email.is_none());
    assert!(account.name.is_none());
    assert_eq!(h.provider.request_count().await, 0);
}

#[tokio::test]
async fn registration_short_name_and_bad_email_reprompt() {
    let h = TestHarness::new().await.unwrap();
    h.reply(GUEST, "quero cadastrar meu negócio").await;
    h.reply(GUEST, "1").await;
    h.reply(GUEST, "1").await;

    assert_eq!(
        h.reply(GUEST, "Z").await,
        "Informe o nome do estabelecimento (mínimo 2 letras)."
    );
    assert_eq!(h.session(GUEST).await.unwrap().unwrap().state, DialogueState::RegAwaitingName);

    h.reply(GUEST, "Barbearia do Zé").await;
    h.provider.add_text("sem lista").await;
    h.reply(GUEST, "corte").await;

    assert_eq!(
        h.reply(GUEST, "ze barbearia").await,
        "E-mail inválido. Informe um e-mail como nome@exemplo.com"
    );
    assert_eq!(h.session(GUEST).await.unwrap().unwrap().state, DialogueState::RegAwaitingEmail);
    assert!(h.storage.find_account_by_phone(GUEST).await.unwrap().is_none());
}
