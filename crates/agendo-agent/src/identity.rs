// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves who is speaking and which tenant the conversation is about.

use agendo_core::{Account, AccountRole, AgendoError, Persona, StorageAdapter};
use tracing::debug;

/// The speaker of a turn.
#[derive(Debug, Clone)]
pub struct Identity {
    pub persona: Persona,
    pub account: Option<Account>,
    pub tenant_id: Option<String>,
    /// The management account's own calendar.
    pub calendar_id: Option<String>,
    /// Tenant owner followed by its staff.
    pub roster: Vec<String>,
}

impl Identity {
    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.id.as_str())
    }
}

/// Professionals of a tenant: the owner account first, then staff in
/// creation order. Empty when the tenant does not exist.
pub async fn roster_accounts(
    storage: &dyn StorageAdapter,
    tenant_id: &str,
) -> Result<Vec<Account>, AgendoError> {
    let Some(owner) = storage.get_account(tenant_id).await? else {
        return Ok(Vec::new());
    };
    let mut roster = vec![owner];
    roster.extend(storage.list_staff(tenant_id).await?);
    Ok(roster)
}

async fn roster_ids(
    storage: &dyn StorageAdapter,
    tenant_id: Option<&str>,
) -> Result<Vec<String>, AgendoError> {
    match tenant_id {
        Some(id) => Ok(roster_accounts(storage, id)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect()),
        None => Ok(Vec::new()),
    }
}

/// The tenant a client talks to when no hint is given: the only one.
async fn default_tenant(
    storage: &dyn StorageAdapter,
    hint: Option<&str>,
) -> Result<Option<String>, AgendoError> {
    if let Some(hint) = hint {
        return Ok(Some(hint.to_string()));
    }
    let tenants = storage.list_tenants().await?;
    Ok(match tenants.as_slice() {
        [only] => Some(only.id.clone()),
        _ => None,
    })
}

/// Resolves an address (normalized phone digits) to an [`Identity`].
pub async fn resolve_identity(
    storage: &dyn StorageAdapter,
    address: &str,
    tenant_hint: Option<&str>,
    self_channel: bool,
) -> Result<Identity, AgendoError> {
    let account = storage.find_account_by_phone(address).await?;

    if let Some(acc) = account.as_ref().filter(|a| a.role.is_management()) {
        let (persona, tenant_id, calendar_id) = match acc.role {
            AccountRole::SuperAdmin => (
                Persona::SuperAdmin,
                tenant_hint.map(str::to_string),
                tenant_hint.map(str::to_string),
            ),
            AccountRole::Staff => (
                Persona::Staff,
                Some(acc.managed_tenant_id().to_string()),
                Some(acc.id.clone()),
            ),
            _ => (Persona::Owner, Some(acc.id.clone()), Some(acc.id.clone())),
        };
        let roster = roster_ids(storage, tenant_id.as_deref()).await?;
        debug!(address, persona = %persona, tenant_id = ?tenant_id, "resolved management identity");
        return Ok(Identity {
            persona,
            account,
            tenant_id,
            calendar_id,
            roster,
        });
    }

    if self_channel && let Some(hint) = tenant_hint {
        let roster = roster_ids(storage, Some(hint)).await?;
        debug!(address, tenant_id = hint, "self-channel message resolved as owner");
        return Ok(Identity {
            persona: Persona::Owner,
            account: None,
            tenant_id: Some(hint.to_string()),
            calendar_id: Some(hint.to_string()),
            roster,
        });
    }

    let tenant_id = default_tenant(storage, tenant_hint).await?;
    let roster = roster_ids(storage, tenant_id.as_deref()).await?;
    let persona = if account.is_some() {
        Persona::Client
    } else {
        Persona::Guest
    };
    Ok(Identity {
        persona,
        account,
        tenant_id,
        calendar_id: None,
        roster,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, harness};

    #[tokio::test]
    async fn owner_wins_over_client_for_same_number() {
        let h = harness("2025-06-02T09:00:00-03:00").await;
        let mut client = account("c1", "5511987654321", AccountRole::Client);
        client.name = Some("Cliente".into());
        h.storage.upsert_account(&client).await.unwrap();
        h.storage
            .upsert_account(&account("o1", "11987654321", AccountRole::Owner))
            .await
            .unwrap();

        let id = resolve_identity(h.storage.as_ref(), "5511987654321", None, false)
            .await
            .unwrap();
        assert_eq!(id.persona, Persona::Owner);
        assert_eq!(id.tenant_id.as_deref(), Some("o1"));
        assert_eq!(id.calendar_id.as_deref(), Some("o1"));
        assert_eq!(id.roster, vec!["o1".to_string()]);
    }

    #[tokio::test]
    async fn staff_sees_tenant_roster_but_owns_calendar() {
        let h = harness("2025-06-02T09:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        let mut staff = account("s1", "5511900000002", AccountRole::Staff);
        staff.owner_id = Some("o1".into());
        h.storage.upsert_account(&staff).await.unwrap();

        let id = resolve_identity(h.storage.as_ref(), "5511900000002", None, false)
            .await
            .unwrap();
        assert_eq!(id.persona, Persona::Staff);
        assert_eq!(id.tenant_id.as_deref(), Some("o1"));
        assert_eq!(id.calendar_id.as_deref(), Some("s1"));
        assert_eq!(id.roster, vec!["o1".to_string(), "s1".to_string()]);
    }

    #[tokio::test]
    async fn self_channel_with_hint_is_owner() {
        let h = harness("2025-06-02T09:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        let id = resolve_identity(h.storage.as_ref(), "5511955555555", Some("o1"), true)
            .await
            .unwrap();
        assert_eq!(id.persona, Persona::Owner);
        assert!(id.account.is_none());
        assert_eq!(id.tenant_id.as_deref(), Some("o1"));
    }

    #[tokio::test]
    async fn unknown_number_is_guest_of_the_single_tenant() {
        let h = harness("2025-06-02T09:00:00-03:00").await;
        h.storage
            .upsert_account(&account("o1", "5511900000001", AccountRole::Owner))
            .await
            .unwrap();
        let id = resolve_identity(h.storage.as_ref(), "5511977777777", None, false)
            .await
            .unwrap();
        assert_eq!(id.persona, Persona::Guest);
        assert_eq!(id.tenant_id.as_deref(), Some("o1"));

        h.storage
            .upsert_account(&account("o2", "5511900000002", AccountRole::Owner))
            .await
            .unwrap();
        let id = resolve_identity(h.storage.as_ref(), "5511977777777", None, false)
            .await
            .unwrap();
        assert!(id.tenant_id.is_none());
        assert!(id.roster.is_empty());
    }

    #[tokio::test]
    async fn known_client_uses_hint() {
        let h = harness("2025-06-02T09:00:00-03:00").await;
        for id in ["o1", "o2"] {
            h.storage
                .upsert_account(&account(id, &format!("55119000000{}", &id[1..]), AccountRole::Owner))
                .await
                .unwrap();
        }
        h.storage
            .upsert_account(&account("c1", "5511966666666", AccountRole::Client))
            .await
            .unwrap();
        let id = resolve_identity(h.storage.as_ref(), "5511966666666", Some("o2"), false)
            .await
            .unwrap();
        assert_eq!(id.persona, Persona::Client);
        assert_eq!(id.tenant_id.as_deref(), Some("o2"));
    }
}
