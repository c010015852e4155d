// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant administration tools: staff roster, subscription, platform view.

use agendo_core::text::normalize_phone;
use agendo_core::{Account, AccountRole, AgendoError};
use agendo_skill::{Tool, ToolOutput, ToolScope};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::{ToolDeps, args, tool_error};

fn tenant_of(tool: &str, scope: &ToolScope) -> Result<String, AgendoError> {
    scope
        .tenant_id
        .clone()
        .ok_or_else(|| tool_error(tool, "no establishment selected"))
}

pub struct ListStaff(pub ToolDeps);

#[async_trait]
impl Tool for ListStaff {
    fn name(&self) -> &str {
        "list_staff"
    }

    fn description(&self) -> &str {
        "List the professionals working for the establishment"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, scope: &ToolScope, _input: Value) -> Result<ToolOutput, AgendoError> {
        let tenant = tenant_of(self.name(), scope)?;
        let staff = self.0.storage.list_staff(&tenant).await?;
        let rows: Vec<Value> = staff
            .iter()
            .map(|s| json!({ "id": s.id, "name": s.display_name(), "phone": s.phone }))
            .collect();
        ToolOutput::json(&rows)
    }
}

pub struct AddStaff(pub ToolDeps);

#[async_trait]
impl Tool for AddStaff {
    fn name(&self) -> &str {
        "add_staff"
    }

    fn description(&self) -> &str {
        "Register a new professional for the establishment"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "phone": { "type": "string", "description": "Phone number with area code" }
            },
            "required": ["name", "phone"]
        })
    }

    async fn invoke(&self, scope: &ToolScope, input: Value) -> Result<ToolOutput, AgendoError> {
        #[derive(Deserialize)]
        struct Args {
            name: String,
            phone: String,
        }
        let a: Args = args(self.name(), input)?;
        let tenant = tenant_of(self.name(), scope)?;
        let phone = normalize_phone(&a.phone);
        let name = a.name.trim();
        if phone.len() < 10 || name.chars().count() < 2 {
            return Ok(ToolOutput::error("a name and a full phone number are required"));
        }
        if let Some(existing) = self.0.storage.find_account_by_phone(&phone).await?
            && existing.role.is_management()
        {
            return Ok(ToolOutput::error("this phone already belongs to a professional"));
        }

        let mut staff = Account::guest(uuid::Uuid::new_v4().to_string(), phone);
        staff.role = AccountRole::Staff;
        staff.name = Some(name.to_string());
        staff.owner_id = Some(tenant.clone());
        self.0.storage.upsert_account(&staff).await?;
        info!(tenant_id = %tenant, staff_id = %staff.id, "staff member added");
        ToolOutput::json(&json!({ "id": staff.id, "name": name }))
    }
}

pub struct SubscriptionStatus(pub ToolDeps);

#[async_trait]
impl Tool for SubscriptionStatus {
    fn name(&self) -> &str {
        "subscription_status"
    }

    fn description(&self) -> &str {
        "Show the establishment's plan and subscription status"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, scope: &ToolScope, _input: Value) -> Result<ToolOutput, AgendoError> {
        let tenant = tenant_of(self.name(), scope)?;
        let Some(account) = self.0.storage.get_account(&tenant).await? else {
            return Err(tool_error(self.name(), format!("tenant {tenant} not found")));
        };
        ToolOutput::json(&json!({
            "tenant_id": account.id,
            "plan": account.plan,
            "subscription_status": account.subscription_status.to_string(),
            "niche": account.niche,
        }))
    }
}

pub struct ListTenants(pub ToolDeps);

#[async_trait]
impl Tool for ListTenants {
    fn name(&self) -> &str {
        "list_tenants"
    }

    fn description(&self) -> &str {
        "List every establishment on the platform"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _scope: &ToolScope, _input: Value) -> Result<ToolOutput, AgendoError> {
        let tenants = self.0.storage.list_tenants().await?;
        let rows: Vec<Value> = tenants
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "name": t.display_name(),
                    "niche": t.niche,
                    "plan": t.plan,
                    "subscription_status": t.subscription_status.to_string(),
                })
            })
            .collect();
        ToolOutput::json(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, harness};
    use agendo_skill::ToolRole;

    fn owner_scope() -> ToolScope {
        ToolScope {
            role: ToolRole::Owner,
            tenant_id: Some("o1".into()),
            calendar_id: Some("o1".into()),
            roster: vec!["o1".into()],
            caller_account_id: Some("o1".into()),
            caller_phone: "5511900000001".into(),
        }
    }

    #[tokio::test]
    async fn add_staff_then_list() {
        let h = harness("2025-06-02T10:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        let deps = ToolDeps {
            storage: h.storage.clone(),
            ledger: h.ctx.ledger.clone(),
        };

        let out = AddStaff(deps.clone())
            .invoke(&owner_scope(), json!({"name": "Carlos", "phone": "+55 (11) 93333-3333"}))
            .await
            .unwrap();
        assert!(!out.is_error);

        let dup = AddStaff(deps.clone())
            .invoke(&owner_scope(), json!({"name": "Carlos", "phone": "5511933333333"}))
            .await
            .unwrap();
        assert!(dup.is_error);

        let listed = ListStaff(deps.clone())
            .invoke(&owner_scope(), json!({}))
            .await
            .unwrap();
        assert!(listed.content.contains("Carlos"));
        assert!(listed.content.contains("5511933333333"));

        let tenants = ListTenants(deps).invoke(&owner_scope(), json!({})).await.unwrap();
        assert!(tenants.content.contains("o1"));
        assert!(!tenants.content.contains("Carlos"));
    }
}
