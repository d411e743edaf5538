//! Invite issue, verification and acceptance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::{
    hash_token, Account, Caller, FounderProfile, Invite, InviteStatus, Role, TalentProfile,
};
use crate::error::{ErrorCode, MarketError, Result};
use crate::services::auth::{self, SignedIn};
use crate::storage::{InviteFilter, MarketplaceStorage, Onboarding, StarterProfile};
use crate::validation::{self, Validate, ValidationErrors};

const MAX_NOTE_LEN: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInviteInput {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for CreateInviteInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("email", validation::email(&self.email));
        errors.check("note", validation::optional_length(self.note.as_deref(), MAX_NOTE_LEN));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInviteInput {
    pub token: String,
    pub display_name: String,
    pub password: String,
}

impl Validate for AcceptInviteInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("token", validation::required(&self.token));
        errors.check("display_name", validation::length(&self.display_name, 1, 120));
        errors.check("password", validation::password(&self.password));
        errors.into_result()
    }
}

impl Validate for InviteFilter {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("email", validation::optional_length(self.email.as_deref(), 254));
        errors.into_result()
    }
}

/// A new invite together with the only copy of its clear token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvite {
    pub invite: Invite,
    pub token: String,
    pub accept_url: String,
}

/// What an unauthenticated visitor may learn from an invite token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviteSummary {
    pub email: String,
    pub role: Role,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
}

fn invite_not_found() -> MarketError {
    MarketError::invite(ErrorCode::INVITE_NOT_FOUND, "invite not found")
}

pub fn accept_url(config: &AppConfig, token: &str) -> String {
    format!("{}/invite/{}", config.server.base_url(), token)
}

pub async fn create_invite(
    storage: &dyn MarketplaceStorage,
    config: &AppConfig,
    admin: Option<&Caller>,
    input: &CreateInviteInput,
    now: DateTime<Utc>,
) -> Result<IssuedInvite> {
    let email = validation::normalize_email(&input.email);
    if storage.accounts().find_by_email(&email).await?.is_some() {
        return Err(MarketError::invite(
            ErrorCode::INVITE_ACCOUNT_EXISTS,
            format!("an account for {} already exists", email),
        ));
    }

    for mut earlier in storage.invites().pending_for_email(&email).await? {
        if earlier.revoke(now).is_ok() {
            storage.invites().update(&earlier).await?;
            debug!(invite_id = %earlier.id, "Superseded pending invite revoked");
        }
    }

    let (invite, token) = Invite::issue(
        &email,
        input.role,
        admin.map(|a| a.account_id),
        validation::blank_to_none(input.note.clone()),
        config.auth.invite_ttl_chrono(),
        now,
    );
    storage.invites().insert(&invite).await?;
    info!(invite_id = %invite.id, role = %invite.role, "Invite issued");

    Ok(IssuedInvite {
        accept_url: accept_url(config, &token),
        invite,
        token,
    })
}

/// Load an invite by clear token, persisting lazy expiry when first observed
async fn load_by_token(
    storage: &dyn MarketplaceStorage,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Invite> {
    let mut invite = storage
        .invites()
        .find_by_token_hash(&hash_token(token))
        .await?
        .ok_or_else(invite_not_found)?;
    if invite.expire(now) {
        storage.invites().update(&invite).await?;
        debug!(invite_id = %invite.id, "Invite expired");
    }
    Ok(invite)
}

pub async fn verify_invite(
    storage: &dyn MarketplaceStorage,
    token: &str,
    now: DateTime<Utc>,
) -> Result<InviteSummary> {
    let invite = load_by_token(storage, token, now).await?;
    Ok(InviteSummary {
        email: invite.email,
        role: invite.role,
        status: invite.status,
        expires_at: invite.expires_at,
    })
}

/// Create the invited account with an empty profile, consume the invite and
/// sign the new account in. The account, profile and invite are written as
/// one unit.
pub async fn accept_invite(
    storage: &dyn MarketplaceStorage,
    config: &AppConfig,
    input: &AcceptInviteInput,
    now: DateTime<Utc>,
) -> Result<SignedIn> {
    let mut invite = load_by_token(storage, &input.token, now).await?;
    invite.check_acceptable(now)?;

    let account = Account::new(
        &invite.email,
        invite.role,
        &input.display_name,
        &input.password,
        now,
    );
    let profile = match account.role {
        Role::Talent => {
            StarterProfile::Talent(TalentProfile::draft(account.id, &account.display_name, now))
        }
        Role::Founder => {
            StarterProfile::Founder(FounderProfile::empty(account.id, &account.display_name, now))
        }
        Role::Admin => StarterProfile::None,
    };
    invite.mark_used(account.id, now)?;

    let onboarding = Onboarding {
        invite,
        account,
        profile,
    };
    storage
        .complete_onboarding(&onboarding)
        .await
        .map_err(|e| {
            if e.is_conflict() {
                MarketError::invite(
                    ErrorCode::INVITE_ACCOUNT_EXISTS,
                    format!("an account for {} already exists", onboarding.account.email),
                )
            } else {
                e.into()
            }
        })?;
    let Onboarding { invite, account, .. } = onboarding;
    info!(invite_id = %invite.id, account_id = %account.id, "Invite accepted");

    auth::start_session(storage, &account, &config.auth, now).await
}

/// Lists with expiry applied, so `status = expired` filters are accurate
pub async fn list_invites(
    storage: &dyn MarketplaceStorage,
    filter: &InviteFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Invite>> {
    let expired = storage.invites().expire_stale(now).await?;
    if expired > 0 {
        debug!(count = expired, "Stale invites expired");
    }
    let mut filter = filter.clone();
    filter.email = filter.email.as_deref().map(validation::normalize_email);
    Ok(storage.invites().list(&filter).await?)
}

pub async fn revoke_invite(
    storage: &dyn MarketplaceStorage,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<Invite> {
    let mut invite = storage
        .invites()
        .get(id)
        .await?
        .ok_or_else(invite_not_found)?;
    invite.revoke(now)?;
    storage.invites().update(&invite).await?;
    info!(invite_id = %invite.id, "Invite revoked");
    Ok(invite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurationStatus;
    use crate::error::RpcErrorCode;
    use crate::services::fixtures::{account, now};
    use crate::storage::MemoryBackend;
    use chrono::Duration;

    fn create_input(email: &str, role: Role) -> CreateInviteInput {
        CreateInviteInput {
            email: email.to_string(),
            role,
            note: Some("  ".to_string()),
        }
    }

    fn accept_input(token: &str) -> AcceptInviteInput {
        AcceptInviteInput {
            token: token.to_string(),
            display_name: "Grace Hopper".to_string(),
            password: "compilers!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_and_accept_talent_invite() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let admin = account(&storage, "admin@example.com", Role::Admin).await;

        let issued = create_invite(
            &storage,
            &config,
            Some(&admin),
            &create_input("Grace@Example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(issued.invite.email, "grace@example.com");
        assert_eq!(issued.invite.note, None);
        assert_eq!(
            issued.accept_url,
            format!("http://localhost:3000/invite/{}", issued.token)
        );

        let summary = verify_invite(&storage, &issued.token, now()).await.unwrap();
        assert_eq!(summary.status, InviteStatus::Pending);
        assert_eq!(summary.role, Role::Talent);

        let signed_in = accept_invite(&storage, &config, &accept_input(&issued.token), now())
            .await
            .unwrap();
        assert_eq!(signed_in.caller.role, Role::Talent);
        assert_eq!(signed_in.caller.email, "grace@example.com");

        let profile = storage
            .talent()
            .get(signed_in.caller.account_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.status, CurationStatus::Draft);
        assert_eq!(profile.full_name, "Grace Hopper");

        let stored = storage.invites().get(issued.invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Accepted);
        assert_eq!(stored.accepted_account_id, Some(signed_in.caller.account_id));
    }

    #[tokio::test]
    async fn test_token_accepted_at_most_once() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let issued = create_invite(
            &storage,
            &config,
            None,
            &create_input("f@example.com", Role::Founder),
            now(),
        )
        .await
        .unwrap();

        accept_invite(&storage, &config, &accept_input(&issued.token), now())
            .await
            .unwrap();
        let err = accept_invite(&storage, &config, &accept_input(&issued.token), now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVITE_ALREADY_USED);
        assert_eq!(err.rpc_code(), RpcErrorCode::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_expired_invite_is_persisted_and_rejected() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let issued = create_invite(
            &storage,
            &config,
            None,
            &create_input("late@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();

        let later = now() + config.auth.invite_ttl_chrono() + Duration::seconds(1);
        let summary = verify_invite(&storage, &issued.token, later).await.unwrap();
        assert_eq!(summary.status, InviteStatus::Expired);
        let stored = storage.invites().get(issued.invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Expired);

        let err = accept_invite(&storage, &config, &accept_input(&issued.token), later)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVITE_EXPIRED);
        assert!(storage
            .accounts()
            .find_by_email("late@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reissue_revokes_earlier_invite() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let input = create_input("twice@example.com", Role::Talent);
        let first = create_invite(&storage, &config, None, &input, now()).await.unwrap();
        let second = create_invite(&storage, &config, None, &input, now()).await.unwrap();

        let err = accept_invite(&storage, &config, &accept_input(&first.token), now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVITE_REVOKED);
        accept_invite(&storage, &config, &accept_input(&second.token), now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invite_for_existing_account_conflicts() {
        let storage = MemoryBackend::new();
        account(&storage, "taken@example.com", Role::Founder).await;
        let err = create_invite(
            &storage,
            &AppConfig::default(),
            None,
            &create_input("taken@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.rpc_code(), RpcErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let storage = MemoryBackend::new();
        let err = verify_invite(&storage, "deadbeef", now()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_revoke_only_pending() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let issued = create_invite(
            &storage,
            &config,
            None,
            &create_input("r@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();

        let revoked = revoke_invite(&storage, issued.invite.id, now()).await.unwrap();
        assert_eq!(revoked.status, InviteStatus::Revoked);
        let err = revoke_invite(&storage, issued.invite.id, now()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVITE_REVOKED);
    }

    #[tokio::test]
    async fn test_list_applies_expiry() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        create_invite(
            &storage,
            &config,
            None,
            &create_input("old@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();

        let later = now() + Duration::days(30);
        let filter = InviteFilter {
            status: Some(InviteStatus::Expired),
            ..Default::default()
        };
        let expired = list_invites(&storage, &filter, later).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].email, "old@example.com");
    }

    #[tokio::test]
    async fn test_stale_copy_cannot_accept_after_revoke() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let issued = create_invite(
            &storage,
            &config,
            None,
            &create_input("race@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();

        let mut stale = storage.invites().get(issued.invite.id).await.unwrap().unwrap();
        revoke_invite(&storage, issued.invite.id, now()).await.unwrap();

        stale.mark_used(Uuid::new_v4(), now()).unwrap();
        let err: MarketError = storage.invites().update(&stale).await.unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::STORAGE_STALE_WRITE);
        assert_eq!(err.rpc_code(), RpcErrorCode::PreconditionFailed);
        let stored = storage.invites().get(issued.invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Revoked);
    }

    #[tokio::test]
    async fn test_failed_accept_leaves_no_partial_account() {
        let storage = MemoryBackend::new();
        let config = AppConfig::default();
        let issued = create_invite(
            &storage,
            &config,
            None,
            &create_input("late-signup@example.com", Role::Talent),
            now(),
        )
        .await
        .unwrap();
        // Someone else claims the email after the invite went out
        account(&storage, "late-signup@example.com", Role::Founder).await;

        let err = accept_invite(&storage, &config, &accept_input(&issued.token), now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVITE_ACCOUNT_EXISTS);
        assert_eq!(err.rpc_code(), RpcErrorCode::Conflict);

        let stored = storage.invites().get(issued.invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Pending);
        assert_eq!(stored.accepted_account_id, None);
        let profiles = storage
            .talent()
            .list(&crate::storage::TalentFilter::default())
            .await
            .unwrap();
        assert!(profiles.is_empty());
        let sessions = storage.sessions().purge_expired(now() + Duration::days(365)).await.unwrap();
        assert_eq!(sessions, 0);
    }
}
