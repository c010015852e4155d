// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait is the interface every scheduling action exposed to the
//! model implements. The [`ToolRegistry`] resolves tools by name and produces
//! role-filtered schema catalogs for completion requests.

use std::collections::HashMap;
use std::sync::Arc;

use agendo_core::{AgendoError, ToolSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::roles::{RoleAllowList, ToolRole};

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The content returned by the tool (text or JSON).
    pub content: String,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Serializes a value as the tool's JSON result.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, AgendoError> {
        Ok(Self::ok(serde_json::to_string(value)?))
    }
}

/// Who is calling a tool and which calendars it may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolScope {
    pub role: ToolRole,
    /// Tenant the conversation is about.
    pub tenant_id: Option<String>,
    /// The caller's own calendar (management) or the chosen professional (client).
    pub calendar_id: Option<String>,
    /// Professional ids whose calendars are visible to the caller.
    pub roster: Vec<String>,
    pub caller_account_id: Option<String>,
    /// Normalized phone digits of the caller.
    pub caller_phone: String,
}

impl ToolScope {
    /// Whether `professional_id` is inside the caller's visibility scope.
    pub fn can_see(&self, professional_id: &str) -> bool {
        self.roster.iter().any(|id| id == professional_id)
            || self.calendar_id.as_deref() == Some(professional_id)
    }
}

/// A deterministic backend action the model may request by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in the model's tool catalog.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the argument object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the action within the caller's scope.
    async fn invoke(
        &self,
        scope: &ToolScope,
        input: serde_json::Value,
    ) -> Result<ToolOutput, AgendoError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Schemas of the registered tools `role` may use, sorted by name.
    pub fn schemas_for(&self, role: ToolRole, allow: &RoleAllowList) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .filter(|t| allow.allows(role, t.name()))
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
