// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Agendo configuration system.

use std::io::Write;

use agendo_config::diagnostic::ConfigError;
use agendo_config::model::AgendoConfig;
use agendo_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "barbearia-bot"
log_level = "debug"

[storage]
database_path = "/tmp/agendo-test.db"
wal_mode = false

[provider]
api_key = "sk-test"
base_url = "http://localhost:9999/v1"
model = "gpt-test"
max_tokens = 256
temperature = 0.0
timeout_secs = 5

[gateway]
host = "0.0.0.0"
port = 8088
bearer_token = "secret"
bridge_url = "http://bridge:8080"

[scheduling]
utc_offset_minutes = -240
lead_time_minutes = 60
booking_window_days = 10
open = "08:00"
close = "20:00"
slot_minutes = 30
weekdays = [2, 3, 4, 5, 6]

[dialogue]
reset_words = ["menu"]
registration_triggers = ["quero cadastrar"]
menu_nudge = "Digite menu."
serialize_per_address = false

[ai]
briefing = false

[ai.role_tools]
client = ["list_services"]

[registration]
niches = ["Barbearia"]
connect_instructions = "Escaneie o QR code."

[[registration.plans]]
name = "Único"
monthly_price_cents = 2990
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.agent.name, "barbearia-bot");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.provider.max_tokens, 256);
    assert_eq!(config.gateway.port, 8088);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("secret"));
    assert_eq!(config.scheduling.utc_offset_minutes, -240);
    assert_eq!(config.scheduling.slot_minutes, 30);
    assert_eq!(config.scheduling.weekdays, vec![2, 3, 4, 5, 6]);
    assert!(!config.dialogue.serialize_per_address);
    assert!(!config.ai.briefing);
    assert_eq!(
        config.ai.role_tools.get("client"),
        Some(&vec!["list_services".to_string()])
    );
    assert_eq!(config.registration.plans.len(), 1);
    assert_eq!(config.registration.plans[0].monthly_price_cents, 2990);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.agent.name, "agendo");
    assert_eq!(config.agent.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.scheduling.booking_window_days, 7);
    assert_eq!(config.scheduling.open, "09:00");
    assert_eq!(config.scheduling.close, "18:00");
    assert!(config.dialogue.serialize_per_address);
    assert!(config.dialogue.reset_words.contains(&"menu".to_string()));
    assert!(config.ai.briefing);
    assert!(config.ai.role_tools.is_empty());
    assert!(!config.registration.plans.is_empty());
}

#[test]
fn serialized_defaults_match_struct_defaults() {
    let from_toml = load_config_from_str("").unwrap();
    let direct = AgendoConfig::default();
    assert_eq!(from_toml.dialogue.reset_words, direct.dialogue.reset_words);
    assert_eq!(from_toml.scheduling.weekdays, direct.scheduling.weekdays);
    assert_eq!(from_toml.provider.model, direct.provider.model);
}

#[test]
fn unknown_key_is_rejected_with_suggestion() {
    let toml = r#"
[scheduling]
slot_minute = 30
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an UnknownKey error");
    assert_eq!(unknown.0, "slot_minute");
    assert_eq!(unknown.1.as_deref(), Some("slot_minutes"));
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telegram]\nbot_token = \"x\"\n").expect_err("must fail");
    let text = err.to_string();
    assert!(text.contains("unknown field") || text.contains("telegram"), "{text}");
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").expect_err("must fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_)))
    );
}

#[test]
fn validation_runs_after_deserialization() {
    let errors = load_and_validate_str("[scheduling]\nopen = \"18:00\"\nclose = \"09:00\"\n")
        .expect_err("open after close must fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("scheduling.open"))
    ));
}

#[test]
#[serial]
fn env_vars_override_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[gateway]\nport = 4000\nbridge_url = \"http://file\"").unwrap();

    // SAFETY: serialized with the other env-touching tests.
    unsafe {
        std::env::set_var("AGENDO_GATEWAY_PORT", "4100");
        std::env::set_var("AGENDO_SCHEDULING_LEAD_TIME_MINUTES", "15");
    }
    let result = load_and_validate_path(file.path());
    unsafe {
        std::env::remove_var("AGENDO_GATEWAY_PORT");
        std::env::remove_var("AGENDO_SCHEDULING_LEAD_TIME_MINUTES");
    }

    let config = result.expect("valid config");
    assert_eq!(config.gateway.port, 4100);
    assert_eq!(config.gateway.bridge_url, "http://file");
    assert_eq!(config.scheduling.lead_time_minutes, 15);
}

#[test]
#[serial]
fn missing_config_file_falls_back_to_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/agendo.toml"))
        .expect("missing file is skipped");
    assert_eq!(config.agent.name, "agendo");
}
