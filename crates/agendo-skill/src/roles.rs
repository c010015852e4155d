// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-to-tool allow-list.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;

/// Role under which the orchestrator runs a model turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ToolRole {
    Client,
    Staff,
    Owner,
    SuperAdmin,
}

impl ToolRole {
    pub fn is_management(self) -> bool {
        !matches!(self, ToolRole::Client)
    }
}

/// Built-in allow-list as (tool, roles) rows.
const DEFAULT_TABLE: &[(&str, &[ToolRole])] = {
    use ToolRole::*;
    &[
        ("list_services", &[Client, Staff, Owner, SuperAdmin]),
        ("check_availability", &[Client, Staff, Owner, SuperAdmin]),
        ("list_my_appointments", &[Client]),
        ("create_appointment", &[Client]),
        ("cancel_my_appointment", &[Client]),
        ("reschedule_my_appointment", &[Client]),
        ("list_agenda", &[Staff, Owner, SuperAdmin]),
        ("confirm_appointment", &[Staff, Owner]),
        ("mark_paid", &[Staff, Owner]),
        ("cancel_appointment", &[Staff, Owner]),
        ("block_slot", &[Staff, Owner]),
        ("revenue_summary", &[Owner, SuperAdmin]),
        ("list_staff", &[Owner, SuperAdmin]),
        ("add_staff", &[Owner]),
        ("subscription_status", &[Owner, SuperAdmin]),
        ("list_tenants", &[SuperAdmin]),
    ]
};

/// Which tool names each role may use.
#[derive(Debug, Clone)]
pub struct RoleAllowList {
    table: HashMap<ToolRole, BTreeSet<String>>,
}

impl Default for RoleAllowList {
    fn default() -> Self {
        let mut table: HashMap<ToolRole, BTreeSet<String>> =
            ToolRole::iter().map(|r| (r, BTreeSet::new())).collect();
        for (tool, roles) in DEFAULT_TABLE {
            for role in *roles {
                table.entry(*role).or_default().insert((*tool).to_string());
            }
        }
        Self { table }
    }
}

impl RoleAllowList {
    /// The built-in table with whole-role replacements from configuration.
    ///
    /// Keys that are not role names are skipped with a warning.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut list = Self::default();
        for (role, tools) in overrides {
            match ToolRole::from_str(role) {
                Ok(role) => {
                    list.table.insert(role, tools.iter().cloned().collect());
                }
                Err(_) => warn!(role = %role, "ignoring allow-list override for unknown role"),
            }
        }
        list
    }

    pub fn allows(&self, role: ToolRole, tool: &str) -> bool {
        self.table.get(&role).is_some_and(|set| set.contains(tool))
    }

    /// Allowed tool names for a role, sorted.
    pub fn allowed(&self, role: ToolRole) -> Vec<&str> {
        self.table
            .get(&role)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
