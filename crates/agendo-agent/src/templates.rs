// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message copy, placeholder rendering and pt-BR formatting helpers.

use chrono::{Datelike, NaiveDate, Weekday};

pub const CLIENT_MENU_OPTIONS: &str =
    "1. Agendar horário\n2. Meus agendamentos\n3. Falar com o assistente";

pub const DEFAULT_GREETING: &str = "Olá, {{user_name}}! Bem-vindo(a) à {{establishment_name}}.";

pub const DEFAULT_GREETING_ANONYMOUS: &str = "Olá! Bem-vindo(a) à {{establishment_name}}.";

pub const DEFAULT_CONFIRMATION: &str = "Agendamento registrado! ✅\n{{service_name}} com {{barber_name}}\n{{date}} às {{time}}";

pub const SLOT_TAKEN: &str = "Que pena, horário já ocupado! Alguém reservou antes de você.";

pub const CLIENT_APOLOGY: &str =
    "Desculpe, tive um problema por aqui. Tente novamente em instantes ou digite *menu*.";

pub const MANAGEMENT_APOLOGY: &str =
    "Não consegui concluir essa ação agora. Tente novamente em instantes.";

pub const INTENT_APOLOGY: &str =
    "Não entendi o pedido. Pode repetir com o nome do cliente e/ou o horário?";

pub const RESTART: &str =
    "Não encontrei os dados do seu agendamento. Vamos recomeçar: digite *menu*.";

pub const MANAGEMENT_MENU_OPTIONS: &str = "1. Agenda de hoje\n2. Confirmar agendamento\n3. Marcar como pago\n4. Cancelar agendamento\n5. Bloquear horário/dia\n6. Faturamento de hoje\n7. Conversar com o assistente";

/// Replaces each `{{key}}` in `template` with its value.
///
/// Single pass: substituted values are never scanned again. Placeholders
/// without a value are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Formats cents as Brazilian currency, e.g. `R$ 1.234,56`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let reais = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Dom",
        Weekday::Mon => "Seg",
        Weekday::Tue => "Ter",
        Weekday::Wed => "Qua",
        Weekday::Thu => "Qui",
        Weekday::Fri => "Sex",
        Weekday::Sat => "Sáb",
    }
}

/// `dd/mm`.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

/// `Seg 02/06`.
pub fn labeled_date(date: NaiveDate) -> String {
    format!("{} {}", weekday_abbrev(date.weekday()), short_date(date))
}

/// Renders a stored `YYYY-MM-DD` date as `dd/mm`, or returns it unchanged.
pub fn display_date(stored: &str) -> String {
    NaiveDate::parse_from_str(stored, "%Y-%m-%d")
        .map(short_date)
        .unwrap_or_else(|_| stored.to_string())
}

/// `1. a\n2. b`.
pub fn numbered<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Maps a 1-based numeric reply to an index into a list of `len` items.
pub fn parse_choice(text: &str, len: usize) -> Option<usize> {
    let n: usize = text.trim().trim_end_matches('.').parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

/// Appends the menu nudge unless the reply already mentions the menu.
pub fn with_menu_nudge(reply: &str, nudge: &str) -> String {
    let reply = reply.trim();
    if reply.is_empty() {
        nudge.to_string()
    } else if agendo_core::text::fold(reply).contains("menu") {
        reply.to_string()
    } else {
        format!("{reply}\n\n{nudge}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_known_and_keeps_unknown() {
        let out = render(
            "Oi {{user_name}}, {{service_name}} às {{time}} {{mystery}}",
            &[("user_name", "Ana"), ("service_name", "Corte"), ("time", "10:00")],
        );
        assert_eq!(out, "Oi Ana, Corte às 10:00 {{mystery}}");
    }

    #[test]
    fn render_inserts_values_verbatim() {
        let out = render(
            "{{user_name}} às {{time}}",
            &[("user_name", "Zé {{time}}"), ("time", "10:00")],
        );
        assert_eq!(out, "Zé {{time}} às 10:00");
        assert_eq!(render("fim {{aberto", &[("aberto", "x")]), "fim {{aberto");
        assert_eq!(render("sem chaves", &[]), "sem chaves");
    }

    #[test]
    fn brl_formatting() {
        assert_eq!(format_brl(0), "R$ 0,00");
        assert_eq!(format_brl(4500), "R$ 45,00");
        assert_eq!(format_brl(123456), "R$ 1.234,56");
        assert_eq!(format_brl(100000000), "R$ 1.000.000,00");
        assert_eq!(format_brl(-990), "-R$ 9,90");
    }

    #[test]
    fn dates_render_in_brazilian_order() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(short_date(date), "02/06");
        assert_eq!(labeled_date(date), "Seg 02/06");
        assert_eq!(display_date("2025-06-07"), "07/06");
        assert_eq!(display_date("garbage"), "garbage");
    }

    #[test]
    fn choices_are_one_based_and_bounded() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("3.", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("dois", 3), None);
    }

    #[test]
    fn nudge_only_when_menu_missing() {
        let nudge = "Digite *menu* para ver as opções.";
        assert_eq!(
            with_menu_nudge("Abrimos às 9h.", nudge),
            format!("Abrimos às 9h.\n\n{nudge}")
        );
        assert_eq!(with_menu_nudge("Volte ao MENU quando quiser.", nudge), "Volte ao MENU quando quiser.");
        assert_eq!(with_menu_nudge("   ", nudge), nudge);
    }

    #[test]
    fn numbered_list() {
        assert_eq!(numbered(&["a", "b"]), "1. a\n2. b");
        assert_eq!(numbered::<&str>(&[]), "");
    }
}
