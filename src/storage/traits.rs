//! Core trait definitions for the storage layer

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::StorageResult;
use super::types::*;
use crate::domain::{
    Account, CurationStatus, FounderProfile, IntroRequest, Invite, PastRole, Role, Session,
    ShortlistEntry, Tag, TalentProfile,
};

/// Unified storage interface providing access to every table
#[async_trait]
pub trait MarketplaceStorage: Send + Sync {
    fn accounts(&self) -> &dyn AccountStorage;

    fn sessions(&self) -> &dyn SessionStorage;

    fn invites(&self) -> &dyn InviteStorage;

    fn talent(&self) -> &dyn TalentStorage;

    fn founders(&self) -> &dyn FounderStorage;

    fn intros(&self) -> &dyn IntroStorage;

    fn past_roles(&self) -> &dyn PastRoleStorage;

    fn shortlists(&self) -> &dyn ShortlistStorage;

    fn tags(&self) -> &dyn TagStorage;

    /// Apply an accepted invite in one unit: insert the account and its
    /// starter profile and replace the invite. Nothing is written when the
    /// stored invite is no longer pending (`Stale`) or the email is taken
    /// (`Conflict`).
    async fn complete_onboarding(&self, onboarding: &Onboarding) -> StorageResult<()>;

    /// Check the health of the storage backend
    async fn health_check(&self) -> StorageResult<HealthStatus>;
}

#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Insert a new account; `Conflict` when the email is taken
    async fn insert(&self, account: &Account) -> StorageResult<()>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<Account>>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<Account>>;

    async fn touch_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> StorageResult<()>;

    async fn list(&self, role: Option<Role>, page: Page) -> StorageResult<Vec<Account>>;

    async fn count_by_role(&self) -> StorageResult<RoleCounts>;
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn insert(&self, session: &Session) -> StorageResult<()>;

    async fn find(&self, token_hash: &str) -> StorageResult<Option<Session>>;

    /// Idempotent
    async fn delete(&self, token_hash: &str) -> StorageResult<()>;

    /// Remove sessions expired at `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize>;
}

#[async_trait]
pub trait InviteStorage: Send + Sync {
    async fn insert(&self, invite: &Invite) -> StorageResult<()>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<Invite>>;

    async fn find_by_token_hash(&self, token_hash: &str) -> StorageResult<Option<Invite>>;

    /// Replace a stored invite that is still pending; `NotFound` when it
    /// does not exist, `Stale` when it has left `pending`
    async fn update(&self, invite: &Invite) -> StorageResult<()>;

    /// Newest first
    async fn list(&self, filter: &InviteFilter) -> StorageResult<Vec<Invite>>;

    /// Invites stored as `pending` for this email (expiry not applied)
    async fn pending_for_email(&self, email: &str) -> StorageResult<Vec<Invite>>;

    /// Counts by stored status (expiry not applied)
    async fn count_by_status(&self) -> StorageResult<InviteCounts>;

    /// Persist `pending -> expired` for every invite past `expires_at`
    async fn expire_stale(&self, now: DateTime<Utc>) -> StorageResult<usize>;
}

#[async_trait]
pub trait TalentStorage: Send + Sync {
    async fn upsert(&self, profile: &TalentProfile) -> StorageResult<()>;

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<TalentProfile>>;

    /// Featured first, then most recently updated
    async fn list(&self, filter: &TalentFilter) -> StorageResult<Vec<TalentProfile>>;

    async fn count_by_status(&self) -> StorageResult<CurationCounts>;

    /// Distinct skills on profiles in `statuses` (all when empty), sorted
    /// ignoring case
    async fn skill_names(&self, statuses: &[CurationStatus]) -> StorageResult<Vec<String>>;
}

#[async_trait]
pub trait FounderStorage: Send + Sync {
    async fn upsert(&self, profile: &FounderProfile) -> StorageResult<()>;

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<FounderProfile>>;
}

#[async_trait]
pub trait IntroStorage: Send + Sync {
    async fn insert(&self, intro: &IntroRequest) -> StorageResult<()>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<IntroRequest>>;

    /// Replace a stored request that is still pending; `NotFound` when it
    /// does not exist, `Stale` when it was already reviewed
    async fn update(&self, intro: &IntroRequest) -> StorageResult<()>;

    /// Remove a pending request, with the same errors as `update`
    async fn delete_pending(&self, id: Uuid) -> StorageResult<()>;

    /// Newest first
    async fn list(&self, filter: &IntroFilter) -> StorageResult<Vec<IntroRequest>>;

    async fn find_pending(
        &self,
        founder_id: Uuid,
        talent_id: Uuid,
    ) -> StorageResult<Option<IntroRequest>>;

    async fn count_by_status(&self) -> StorageResult<IntroCounts>;
}

#[async_trait]
pub trait PastRoleStorage: Send + Sync {
    async fn insert(&self, role: &PastRole) -> StorageResult<()>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<PastRole>>;

    /// `NotFound` when it does not exist
    async fn update(&self, role: &PastRole) -> StorageResult<()>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;

    /// Most recent start first
    async fn list_for(&self, talent_id: Uuid) -> StorageResult<Vec<PastRole>>;
}

#[async_trait]
pub trait ShortlistStorage: Send + Sync {
    /// Insert or replace the entry for its founder and talent
    async fn upsert(&self, entry: &ShortlistEntry) -> StorageResult<()>;

    async fn get(&self, founder_id: Uuid, talent_id: Uuid)
        -> StorageResult<Option<ShortlistEntry>>;

    /// Idempotent
    async fn remove(&self, founder_id: Uuid, talent_id: Uuid) -> StorageResult<()>;

    /// Newest first
    async fn list_for(&self, founder_id: Uuid) -> StorageResult<Vec<ShortlistEntry>>;
}

#[async_trait]
pub trait TagStorage: Send + Sync {
    /// `Conflict` when a tag with the same name, ignoring case, exists
    async fn insert(&self, tag: &Tag) -> StorageResult<()>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<Tag>>;

    /// Ordered by name
    async fn list(&self) -> StorageResult<Vec<Tag>>;

    /// Idempotent
    async fn attach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()>;

    /// Idempotent
    async fn detach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()>;

    /// Ordered by name
    async fn tags_for(&self, talent_id: Uuid) -> StorageResult<Vec<Tag>>;
}
