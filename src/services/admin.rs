//! Admin dashboard figures and account listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{Account, Caller, CurationStatus, IntroStatus, InviteStatus, Role};
use crate::error::Result;
use crate::services::require_role;
use crate::storage::{MarketplaceStorage, Page};
use crate::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Accounts per role, every role present
    pub accounts: BTreeMap<String, usize>,
    /// Talent profiles per curation status, every status present
    pub talent: BTreeMap<String, usize>,
    pub pending_invites: usize,
    pub pending_intros: usize,
}

pub async fn dashboard_stats(
    storage: &dyn MarketplaceStorage,
    now: DateTime<Utc>,
) -> Result<DashboardStats> {
    storage.invites().expire_stale(now).await?;

    let roles = storage.accounts().count_by_role().await?;
    let curation = storage.talent().count_by_status().await?;
    let invites = storage.invites().count_by_status().await?;
    let intros = storage.intros().count_by_status().await?;

    Ok(DashboardStats {
        accounts: Role::ALL
            .iter()
            .map(|r| (r.to_string(), roles.get(r).copied().unwrap_or(0)))
            .collect(),
        talent: CurationStatus::ALL
            .iter()
            .map(|s| (s.to_string(), curation.get(s).copied().unwrap_or(0)))
            .collect(),
        pending_invites: invites.get(&InviteStatus::Pending).copied().unwrap_or(0),
        pending_intros: intros.get(&IntroStatus::Pending).copied().unwrap_or(0),
    })
}

/// An account without its password digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            role: account.role,
            display_name: account.display_name,
            created_at: account.created_at,
            last_sign_in_at: account.last_sign_in_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAccountsInput {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub page: Page,
}

impl Validate for ListAccountsInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Newest first
pub async fn list_accounts(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &ListAccountsInput,
) -> Result<Vec<AccountSummary>> {
    require_role(admin, Role::Admin)?;
    let accounts = storage.accounts().list(input.role, input.page).await?;
    Ok(accounts.into_iter().map(AccountSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::TalentProfile;
    use crate::services::fixtures::{account, now};
    use crate::services::invites::{self, CreateInviteInput};
    use crate::storage::MemoryBackend;
    use chrono::Duration;

    #[tokio::test]
    async fn test_dashboard_counts() {
        let storage = MemoryBackend::new();
        account(&storage, "admin@example.com", Role::Admin).await;
        let talent = account(&storage, "talent@example.com", Role::Talent).await;
        storage
            .talent()
            .upsert(&TalentProfile::draft(talent.account_id, "T", now()))
            .await
            .unwrap();
        let input = CreateInviteInput {
            email: "new@example.com".to_string(),
            role: Role::Founder,
            note: None,
        };
        invites::create_invite(&storage, &AppConfig::default(), None, &input, now())
            .await
            .unwrap();

        let stats = dashboard_stats(&storage, now()).await.unwrap();
        assert_eq!(stats.accounts["admin"], 1);
        assert_eq!(stats.accounts["founder"], 0);
        assert_eq!(stats.accounts["talent"], 1);
        assert_eq!(stats.talent["draft"], 1);
        assert_eq!(stats.talent["published"], 0);
        assert_eq!(stats.pending_invites, 1);
        assert_eq!(stats.pending_intros, 0);

        let stats = dashboard_stats(&storage, now() + Duration::days(8)).await.unwrap();
        assert_eq!(stats.pending_invites, 0);
    }

    #[tokio::test]
    async fn test_list_accounts_hides_password() {
        let storage = MemoryBackend::new();
        let admin = account(&storage, "admin@example.com", Role::Admin).await;
        let founder = account(&storage, "founder@example.com", Role::Founder).await;
        account(&storage, "talent@example.com", Role::Talent).await;

        let all = list_accounts(&storage, &admin, &ListAccountsInput::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        let json = serde_json::to_value(&all[0]).unwrap();
        assert!(json.get("password").is_none());

        let input = ListAccountsInput {
            role: Some(Role::Talent),
            page: Page::default(),
        };
        let talent = list_accounts(&storage, &admin, &input).await.unwrap();
        assert_eq!(talent.len(), 1);
        assert_eq!(talent[0].email, "talent@example.com");

        let err = list_accounts(&storage, &founder, &input).await.unwrap_err();
        assert_eq!(err.rpc_code(), crate::error::RpcErrorCode::Forbidden);
    }
}
