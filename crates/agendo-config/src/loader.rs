// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./agendo.toml` > `~/.config/agendo/agendo.toml` > `/etc/agendo/agendo.toml`
//! with environment variable overrides via `AGENDO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AgendoConfig;

/// Top-level sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "storage",
    "provider",
    "gateway",
    "scheduling",
    "dialogue",
    "ai",
    "registration",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/agendo/agendo.toml` (system-wide)
/// 3. `~/.config/agendo/agendo.toml` (user XDG config)
/// 4. `./agendo.toml` (local directory)
/// 5. `AGENDO_*` environment variables
pub fn load_config() -> Result<AgendoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AgendoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgendoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AgendoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgendoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AgendoConfig::default()))
        .merge(Toml::file("/etc/agendo/agendo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("agendo/agendo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("agendo.toml"))
        .merge(env_provider())
}

/// Maps `AGENDO_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `AGENDO_GATEWAY_BRIDGE_URL` maps to `gateway.bridge_url`.
fn env_provider() -> Env {
    Env::prefixed("AGENDO_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_first_underscore_only() {
        assert_eq!(map_env_key("gateway_bridge_url"), "gateway.bridge_url");
        assert_eq!(map_env_key("provider_api_key"), "provider.api_key");
        assert_eq!(map_env_key("ai_briefing"), "ai.briefing");
        assert_eq!(
            map_env_key("scheduling_utc_offset_minutes"),
            "scheduling.utc_offset_minutes"
        );
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }
}
