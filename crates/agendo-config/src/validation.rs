// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as working-hour ordering, slot sizes and known role names.

use crate::diagnostic::ConfigError;
use crate::model::AgendoConfig;

/// Role names accepted as `ai.role_tools` keys.
pub const KNOWN_ROLES: &[&str] = &["client", "staff", "owner", "super_admin"];

/// Parses `HH:MM` into minutes since midnight.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AgendoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let sched = &config.scheduling;
    let open = parse_hhmm(&sched.open);
    let close = parse_hhmm(&sched.close);
    if open.is_none() {
        fail(format!("scheduling.open `{}` is not HH:MM", sched.open));
    }
    if close.is_none() {
        fail(format!("scheduling.close `{}` is not HH:MM", sched.close));
    }
    if let (Some(o), Some(c)) = (open, close)
        && o >= c
    {
        fail(format!(
            "scheduling.open ({}) must be earlier than scheduling.close ({})",
            sched.open, sched.close
        ));
    }
    if sched.slot_minutes == 0 {
        fail("scheduling.slot_minutes must be greater than 0".to_string());
    }
    if !(1..=31).contains(&sched.booking_window_days) {
        fail(format!(
            "scheduling.booking_window_days must be between 1 and 31, got {}",
            sched.booking_window_days
        ));
    }
    if let Some(day) = sched.weekdays.iter().find(|d| **d > 6) {
        fail(format!(
            "scheduling.weekdays entries must be 0..=6 (0 = Sunday), got {day}"
        ));
    }
    if sched.utc_offset_minutes.abs() >= 24 * 60 {
        fail(format!(
            "scheduling.utc_offset_minutes must be within +/-1439, got {}",
            sched.utc_offset_minutes
        ));
    }

    if config.registration.plans.is_empty() {
        fail("registration.plans must list at least one plan".to_string());
    }
    for (i, plan) in config.registration.plans.iter().enumerate() {
        if plan.name.trim().is_empty() {
            fail(format!("registration.plans[{i}].name must not be empty"));
        }
        if plan.monthly_price_cents < 0 {
            fail(format!(
                "registration.plans[{i}].monthly_price_cents must be non-negative"
            ));
        }
    }

    for role in config.ai.role_tools.keys() {
        if !KNOWN_ROLES.contains(&role.as_str()) {
            fail(format!(
                "ai.role_tools has unknown role `{role}` (expected one of {})",
                KNOWN_ROLES.join(", ")
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = AgendoConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = AgendoConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn open_after_close_fails_validation() {
        let mut config = AgendoConfig::default();
        config.scheduling.open = "19:00".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "earlier than"));
    }

    #[test]
    fn malformed_times_are_reported_separately() {
        let mut config = AgendoConfig::default();
        config.scheduling.open = "9h".to_string();
        config.scheduling.close = "25:00".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "scheduling.open `9h`"));
        assert!(has_error(&errors, "scheduling.close `25:00`"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = AgendoConfig::default();
        config.scheduling.slot_minutes = 0;
        config.scheduling.booking_window_days = 0;
        config.scheduling.weekdays = vec![1, 7];
        config.registration.plans.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn unknown_role_in_role_tools_fails() {
        let mut config = AgendoConfig::default();
        config
            .ai
            .role_tools
            .insert("manager".to_string(), vec!["list_agenda".to_string()]);
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "unknown role `manager`"));
    }

    #[test]
    fn parse_hhmm_accepts_only_two_digit_fields() {
        assert_eq!(parse_hhmm("09:30"), Some(570));
        assert_eq!(parse_hhmm("9:30"), None);
        assert_eq!(parse_hhmm("24:00"), None);
    }
}
