// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Agendo scheduling engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Agendo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgendoConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chat transport bridge settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Calendar and slot settings.
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Conversation routing settings.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// AI orchestrator settings.
    #[serde(default)]
    pub ai: AiConfig,

    /// Professional onboarding settings.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used when no tenant persona is configured.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "agendo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("agendo").join("agendo.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "agendo.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// OpenAI-compatible provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. Falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_secs() -> u64 {
    60
}

/// Chat transport bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on inbound webhooks. `None` disables auth.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Base URL of the transport bridge receiving outbound messages.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Bearer token sent to the bridge.
    #[serde(default)]
    pub bridge_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            bridge_url: default_bridge_url(),
            bridge_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

/// Calendar configuration: timezone, slot template defaults and booking window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulingConfig {
    /// Tenant-local offset from UTC in minutes (-180 = UTC-3).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// Minimum notice for same-day bookings.
    #[serde(default = "default_lead_time_minutes")]
    pub lead_time_minutes: u32,

    /// Number of dates offered by the date chooser, starting tomorrow.
    #[serde(default = "default_booking_window_days")]
    pub booking_window_days: u32,

    /// Default opening time, `HH:MM`.
    #[serde(default = "default_open")]
    pub open: String,

    /// Default closing time, `HH:MM`, exclusive.
    #[serde(default = "default_close")]
    pub close: String,

    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Default working weekdays, 0 = Sunday.
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<u8>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            lead_time_minutes: default_lead_time_minutes(),
            booking_window_days: default_booking_window_days(),
            open: default_open(),
            close: default_close(),
            slot_minutes: default_slot_minutes(),
            weekdays: default_weekdays(),
        }
    }
}

fn default_utc_offset_minutes() -> i32 {
    -180
}

fn default_lead_time_minutes() -> u32 {
    30
}

fn default_booking_window_days() -> u32 {
    7
}

fn default_open() -> String {
    "09:00".to_string()
}

fn default_close() -> String {
    "18:00".to_string()
}

fn default_slot_minutes() -> u32 {
    60
}

fn default_weekdays() -> Vec<u8> {
    vec![1, 2, 3, 4, 5, 6]
}

/// Conversation routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialogueConfig {
    /// Words that reset any conversation to its initial menu (matched folded).
    #[serde(default = "default_reset_words")]
    pub reset_words: Vec<String>,

    /// Phrases that start professional onboarding for unknown numbers.
    #[serde(default = "default_registration_triggers")]
    pub registration_triggers: Vec<String>,

    /// Appended to AI replies that do not mention the menu.
    #[serde(default = "default_menu_nudge")]
    pub menu_nudge: String,

    /// Process one turn at a time per address.
    #[serde(default = "default_serialize_per_address")]
    pub serialize_per_address: bool,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            reset_words: default_reset_words(),
            registration_triggers: default_registration_triggers(),
            menu_nudge: default_menu_nudge(),
            serialize_per_address: default_serialize_per_address(),
        }
    }
}

fn default_reset_words() -> Vec<String> {
    ["oi", "ola", "menu", "ajuda", "inicio", "voltar"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_registration_triggers() -> Vec<String> {
    [
        "quero cadastrar",
        "cadastrar meu negocio",
        "sou profissional",
        "quero usar o agendo",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_menu_nudge() -> String {
    "Digite *menu* para ver as opções.".to_string()
}

fn default_serialize_per_address() -> bool {
    true
}

/// AI orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Append the day's agenda to management prompts.
    #[serde(default = "default_briefing")]
    pub briefing: bool,

    /// Per-role tool allow-list overrides, keyed by role name.
    ///
    /// Roles not listed keep the built-in allow-list.
    #[serde(default)]
    pub role_tools: BTreeMap<String, Vec<String>>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            briefing: default_briefing(),
            role_tools: BTreeMap::new(),
        }
    }
}

fn default_briefing() -> bool {
    true
}

/// A subscription plan offered during onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    pub name: String,
    pub monthly_price_cents: i64,
}

/// Professional onboarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Business niches offered as a numbered list; "Outro" is always appended.
    #[serde(default = "default_niches")]
    pub niches: Vec<String>,

    #[serde(default = "default_plans")]
    pub plans: Vec<PlanConfig>,

    /// Final instructions for connecting the tenant's chat number.
    #[serde(default = "default_connect_instructions")]
    pub connect_instructions: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            niches: default_niches(),
            plans: default_plans(),
            connect_instructions: default_connect_instructions(),
        }
    }
}

fn default_niches() -> Vec<String> {
    ["Barbearia", "Salão de beleza", "Estética", "Manicure"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_plans() -> Vec<PlanConfig> {
    vec![
        PlanConfig {
            name: "Básico".to_string(),
            monthly_price_cents: 4990,
        },
        PlanConfig {
            name: "Profissional".to_string(),
            monthly_price_cents: 9990,
        },
    ]
}

fn default_connect_instructions() -> String {
    "Para conectar seu número, abra o painel do Agendo, vá em *Conexão* e escaneie o QR code com o WhatsApp do seu negócio.".to_string()
}
