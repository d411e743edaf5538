//! In-memory storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    experience, tag, Account, CurationStatus, FounderProfile, IntroRequest, IntroStatus, Invite,
    InviteStatus, PastRole, Role, Session, ShortlistEntry, Tag, TalentProfile,
};
use crate::storage::{
    error::{StorageError, StorageResult},
    traits::*,
    types::*,
};

/// In-memory storage backend. Every table is a `RwLock<HashMap>`.
#[derive(Default, Clone)]
pub struct MemoryBackend {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    invites: Arc<RwLock<HashMap<Uuid, Invite>>>,
    talent: Arc<RwLock<HashMap<Uuid, TalentProfile>>>,
    founders: Arc<RwLock<HashMap<Uuid, FounderProfile>>>,
    intros: Arc<RwLock<HashMap<Uuid, IntroRequest>>>,
    past_roles: Arc<RwLock<HashMap<Uuid, PastRole>>>,
    /// Keyed by (founder, talent)
    shortlists: Arc<RwLock<HashMap<(Uuid, Uuid), ShortlistEntry>>>,
    tags: Arc<RwLock<HashMap<Uuid, Tag>>>,
    /// (talent, tag) pairs
    talent_tags: Arc<RwLock<HashSet<(Uuid, Uuid)>>>,
}

impl MemoryBackend {
    /// Create a new memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

fn count_by<T, K, F>(items: impl Iterator<Item = T>, key: F) -> HashMap<K, usize>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(key(&item)).or_insert(0) += 1;
    }
    counts
}

/// Stored invites only change while pending
fn replace_pending_invite(
    invites: &mut HashMap<Uuid, Invite>,
    invite: &Invite,
) -> StorageResult<()> {
    match invites.get_mut(&invite.id) {
        Some(existing) if existing.status == InviteStatus::Pending => {
            *existing = invite.clone();
            Ok(())
        }
        Some(_) => Err(StorageError::stale("invite is no longer pending")),
        None => Err(StorageError::not_found(format!("invite {}", invite.id))),
    }
}

#[async_trait]
impl MarketplaceStorage for MemoryBackend {
    fn accounts(&self) -> &dyn AccountStorage {
        self
    }

    fn sessions(&self) -> &dyn SessionStorage {
        self
    }

    fn invites(&self) -> &dyn InviteStorage {
        self
    }

    fn talent(&self) -> &dyn TalentStorage {
        self
    }

    fn founders(&self) -> &dyn FounderStorage {
        self
    }

    fn intros(&self) -> &dyn IntroStorage {
        self
    }

    fn past_roles(&self) -> &dyn PastRoleStorage {
        self
    }

    fn shortlists(&self) -> &dyn ShortlistStorage {
        self
    }

    fn tags(&self) -> &dyn TagStorage {
        self
    }

    async fn complete_onboarding(&self, onboarding: &Onboarding) -> StorageResult<()> {
        // Lock order: invites, accounts, talent, founders
        let mut invites = self.invites.write().await;
        let mut accounts = self.accounts.write().await;

        let account = &onboarding.account;
        match invites.get(&onboarding.invite.id) {
            Some(stored) if stored.status == InviteStatus::Pending => {}
            Some(_) => return Err(StorageError::stale("invite is no longer pending")),
            None => {
                return Err(StorageError::not_found(format!(
                    "invite {}",
                    onboarding.invite.id
                )))
            }
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StorageError::conflict(format!(
                "an account already exists for {}",
                account.email
            )));
        }

        match &onboarding.profile {
            StarterProfile::Talent(profile) => {
                self.talent
                    .write()
                    .await
                    .insert(profile.account_id, profile.clone());
            }
            StarterProfile::Founder(profile) => {
                self.founders
                    .write()
                    .await
                    .insert(profile.account_id, profile.clone());
            }
            StarterProfile::None => {}
        }
        accounts.insert(account.id, account.clone());
        invites.insert(onboarding.invite.id, onboarding.invite.clone());
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            backend_type: "memory".to_string(),
            latency_ms: 0,
            errors: vec![],
        })
    }
}

#[async_trait]
impl AccountStorage for MemoryBackend {
    async fn insert(&self, account: &Account) -> StorageResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StorageError::conflict(format!(
                "an account already exists for {}",
                account.email
            )));
        }
        if accounts.contains_key(&account.id) {
            return Err(StorageError::conflict(format!(
                "account {} already exists",
                account.id
            )));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn touch_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(format!("account {}", id)))?;
        account.last_sign_in_at = Some(at);
        Ok(())
    }

    async fn list(&self, role: Option<Role>, page: Page) -> StorageResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| role.map_or(true, |r| a.role == r))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.apply(result))
    }

    async fn count_by_role(&self) -> StorageResult<RoleCounts> {
        let accounts = self.accounts.read().await;
        Ok(count_by(accounts.values(), |a| a.role))
    }
}

#[async_trait]
impl SessionStorage for MemoryBackend {
    async fn insert(&self, session: &Session) -> StorageResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> StorageResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn delete(&self, token_hash: &str) -> StorageResult<()> {
        self.sessions.write().await.remove(token_hash);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok(before - sessions.len())
    }
}

#[async_trait]
impl InviteStorage for MemoryBackend {
    async fn insert(&self, invite: &Invite) -> StorageResult<()> {
        let mut invites = self.invites.write().await;
        if invites.contains_key(&invite.id) {
            return Err(StorageError::conflict(format!(
                "invite {} already exists",
                invite.id
            )));
        }
        invites.insert(invite.id, invite.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Invite>> {
        Ok(self.invites.read().await.get(&id).cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> StorageResult<Option<Invite>> {
        Ok(self
            .invites
            .read()
            .await
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn update(&self, invite: &Invite) -> StorageResult<()> {
        let mut invites = self.invites.write().await;
        replace_pending_invite(&mut invites, invite)
    }

    async fn list(&self, filter: &InviteFilter) -> StorageResult<Vec<Invite>> {
        let invites = self.invites.read().await;
        let mut result: Vec<Invite> = invites
            .values()
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .filter(|i| filter.email.as_deref().map_or(true, |e| i.email == e))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(filter.page.apply(result))
    }

    async fn pending_for_email(&self, email: &str) -> StorageResult<Vec<Invite>> {
        Ok(self
            .invites
            .read()
            .await
            .values()
            .filter(|i| i.email == email && i.status == InviteStatus::Pending)
            .cloned()
            .collect())
    }

    async fn count_by_status(&self) -> StorageResult<InviteCounts> {
        let invites = self.invites.read().await;
        Ok(count_by(invites.values(), |i| i.status))
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let mut invites = self.invites.write().await;
        Ok(invites
            .values_mut()
            .map(|invite| invite.expire(now))
            .filter(|expired| *expired)
            .count())
    }
}

#[async_trait]
impl TalentStorage for MemoryBackend {
    async fn upsert(&self, profile: &TalentProfile) -> StorageResult<()> {
        self.talent
            .write()
            .await
            .insert(profile.account_id, profile.clone());
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<TalentProfile>> {
        Ok(self.talent.read().await.get(&account_id).cloned())
    }

    async fn list(&self, filter: &TalentFilter) -> StorageResult<Vec<TalentProfile>> {
        let talent = self.talent.read().await;
        let mut result: Vec<TalentProfile> = talent
            .values()
            .filter(|p| filter.statuses.is_empty() || filter.statuses.contains(&p.status))
            .filter(|p| filter.skill.as_deref().map_or(true, |s| p.has_skill(s)))
            .filter(|p| filter.query.as_deref().map_or(true, |q| p.matches_query(q)))
            .filter(|p| filter.availability.map_or(true, |a| p.availability == a))
            .filter(|p| filter.featured.map_or(true, |f| p.featured == f))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        Ok(filter.page.apply(result))
    }

    async fn count_by_status(&self) -> StorageResult<CurationCounts> {
        let talent = self.talent.read().await;
        Ok(count_by(talent.values(), |p| p.status))
    }

    async fn skill_names(&self, statuses: &[CurationStatus]) -> StorageResult<Vec<String>> {
        let talent = self.talent.read().await;
        let mut names: BTreeMap<String, String> = BTreeMap::new();
        for profile in talent
            .values()
            .filter(|p| statuses.is_empty() || statuses.contains(&p.status))
        {
            for skill in &profile.skills {
                names
                    .entry(skill.to_lowercase())
                    .or_insert_with(|| skill.clone());
            }
        }
        Ok(names.into_values().collect())
    }
}

#[async_trait]
impl FounderStorage for MemoryBackend {
    async fn upsert(&self, profile: &FounderProfile) -> StorageResult<()> {
        self.founders
            .write()
            .await
            .insert(profile.account_id, profile.clone());
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<FounderProfile>> {
        Ok(self.founders.read().await.get(&account_id).cloned())
    }
}

#[async_trait]
impl IntroStorage for MemoryBackend {
    async fn insert(&self, intro: &IntroRequest) -> StorageResult<()> {
        let mut intros = self.intros.write().await;
        let duplicate = intro.status == IntroStatus::Pending
            && intros.values().any(|i| {
                i.founder_id == intro.founder_id
                    && i.talent_id == intro.talent_id
                    && i.status == IntroStatus::Pending
            });
        if duplicate {
            return Err(StorageError::conflict(
                "a pending intro request already exists for this talent",
            ));
        }
        intros.insert(intro.id, intro.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<IntroRequest>> {
        Ok(self.intros.read().await.get(&id).cloned())
    }

    async fn update(&self, intro: &IntroRequest) -> StorageResult<()> {
        let mut intros = self.intros.write().await;
        match intros.get_mut(&intro.id) {
            Some(existing) if existing.status == IntroStatus::Pending => {
                *existing = intro.clone();
                Ok(())
            }
            Some(_) => Err(StorageError::stale(
                "intro request has already been reviewed",
            )),
            None => Err(StorageError::not_found(format!("intro request {}", intro.id))),
        }
    }

    async fn delete_pending(&self, id: Uuid) -> StorageResult<()> {
        let mut intros = self.intros.write().await;
        match intros.get(&id).map(|i| i.status) {
            Some(IntroStatus::Pending) => {
                intros.remove(&id);
                Ok(())
            }
            Some(_) => Err(StorageError::stale(
                "intro request has already been reviewed",
            )),
            None => Err(StorageError::not_found(format!("intro request {}", id))),
        }
    }

    async fn list(&self, filter: &IntroFilter) -> StorageResult<Vec<IntroRequest>> {
        let intros = self.intros.read().await;
        let mut result: Vec<IntroRequest> = intros
            .values()
            .filter(|i| filter.founder_id.map_or(true, |f| i.founder_id == f))
            .filter(|i| filter.talent_id.map_or(true, |t| i.talent_id == t))
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(filter.page.apply(result))
    }

    async fn find_pending(
        &self,
        founder_id: Uuid,
        talent_id: Uuid,
    ) -> StorageResult<Option<IntroRequest>> {
        Ok(self
            .intros
            .read()
            .await
            .values()
            .find(|i| {
                i.founder_id == founder_id
                    && i.talent_id == talent_id
                    && i.status == IntroStatus::Pending
            })
            .cloned())
    }

    async fn count_by_status(&self) -> StorageResult<IntroCounts> {
        let intros = self.intros.read().await;
        Ok(count_by(intros.values(), |i| i.status))
    }
}

#[async_trait]
impl PastRoleStorage for MemoryBackend {
    async fn insert(&self, role: &PastRole) -> StorageResult<()> {
        let mut roles = self.past_roles.write().await;
        if roles.contains_key(&role.id) {
            return Err(StorageError::conflict(format!("past role {} already exists", role.id)));
        }
        roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<PastRole>> {
        Ok(self.past_roles.read().await.get(&id).cloned())
    }

    async fn update(&self, role: &PastRole) -> StorageResult<()> {
        let mut roles = self.past_roles.write().await;
        match roles.get_mut(&role.id) {
            Some(existing) => {
                *existing = role.clone();
                Ok(())
            }
            None => Err(StorageError::not_found(format!("past role {}", role.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.past_roles.write().await.remove(&id).is_some())
    }

    async fn list_for(&self, talent_id: Uuid) -> StorageResult<Vec<PastRole>> {
        let roles = self.past_roles.read().await;
        let mut result: Vec<PastRole> = roles
            .values()
            .filter(|r| r.talent_id == talent_id)
            .cloned()
            .collect();
        experience::sort_newest_first(&mut result);
        Ok(result)
    }
}

#[async_trait]
impl ShortlistStorage for MemoryBackend {
    async fn upsert(&self, entry: &ShortlistEntry) -> StorageResult<()> {
        self.shortlists
            .write()
            .await
            .insert((entry.founder_id, entry.talent_id), entry.clone());
        Ok(())
    }

    async fn get(
        &self,
        founder_id: Uuid,
        talent_id: Uuid,
    ) -> StorageResult<Option<ShortlistEntry>> {
        Ok(self
            .shortlists
            .read()
            .await
            .get(&(founder_id, talent_id))
            .cloned())
    }

    async fn remove(&self, founder_id: Uuid, talent_id: Uuid) -> StorageResult<()> {
        self.shortlists
            .write()
            .await
            .remove(&(founder_id, talent_id));
        Ok(())
    }

    async fn list_for(&self, founder_id: Uuid) -> StorageResult<Vec<ShortlistEntry>> {
        let shortlists = self.shortlists.read().await;
        let mut result: Vec<ShortlistEntry> = shortlists
            .values()
            .filter(|e| e.founder_id == founder_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

fn sort_by_name(tags: &mut [Tag]) {
    tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[async_trait]
impl TagStorage for MemoryBackend {
    async fn insert(&self, new: &Tag) -> StorageResult<()> {
        let mut tags = self.tags.write().await;
        if tags.values().any(|t| tag::same_name(&t.name, &new.name)) {
            return Err(StorageError::conflict(format!(
                "a tag named '{}' already exists",
                new.name
            )));
        }
        tags.insert(new.id, new.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Tag>> {
        Ok(self.tags.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StorageResult<Vec<Tag>> {
        let mut result: Vec<Tag> = self.tags.read().await.values().cloned().collect();
        sort_by_name(&mut result);
        Ok(result)
    }

    async fn attach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()> {
        if !self.tags.read().await.contains_key(&tag_id) {
            return Err(StorageError::not_found(format!("tag {}", tag_id)));
        }
        self.talent_tags.write().await.insert((talent_id, tag_id));
        Ok(())
    }

    async fn detach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()> {
        self.talent_tags.write().await.remove(&(talent_id, tag_id));
        Ok(())
    }

    async fn tags_for(&self, talent_id: Uuid) -> StorageResult<Vec<Tag>> {
        let links = self.talent_tags.read().await;
        let tags = self.tags.read().await;
        let mut result: Vec<Tag> = links
            .iter()
            .filter(|(talent, _)| *talent == talent_id)
            .filter_map(|(_, tag_id)| tags.get(tag_id).cloned())
            .collect();
        sort_by_name(&mut result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurationStatus, IntroDecision};
    use chrono::Duration;

    fn account(email: &str, role: Role) -> Account {
        Account::new(email, role, "Test User", "password123", Utc::now())
    }

    #[tokio::test]
    async fn test_account_email_is_unique() {
        let backend = MemoryBackend::new();
        backend
            .accounts()
            .insert(&account("a@example.com", Role::Talent))
            .await
            .unwrap();
        let err = backend
            .accounts()
            .insert(&account("a@example.com", Role::Founder))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let found = backend
            .accounts()
            .find_by_email("a@example.com")
            .await
            .unwrap();
        assert_eq!(found.unwrap().role, Role::Talent);
    }

    #[tokio::test]
    async fn test_count_by_role() {
        let backend = MemoryBackend::new();
        for (email, role) in [
            ("a@example.com", Role::Admin),
            ("b@example.com", Role::Talent),
            ("c@example.com", Role::Talent),
        ] {
            backend.accounts().insert(&account(email, role)).await.unwrap();
        }
        let counts = backend.accounts().count_by_role().await.unwrap();
        assert_eq!(counts.get(&Role::Talent), Some(&2));
        assert_eq!(counts.get(&Role::Founder), None);
    }

    #[tokio::test]
    async fn test_session_purge() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let (live, _) = Session::start(Uuid::new_v4(), Duration::hours(1), now);
        let (stale, _) = Session::start(Uuid::new_v4(), Duration::seconds(1), now);
        backend.sessions().insert(&live).await.unwrap();
        backend.sessions().insert(&stale).await.unwrap();

        let purged = backend
            .sessions()
            .purge_expired(now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(backend.sessions().find(&live.token_hash).await.unwrap().is_some());
        assert!(backend.sessions().find(&stale.token_hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_stale_invites() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let (short, _) = Invite::issue("a@example.com", Role::Talent, None, None, Duration::hours(1), now);
        let (long, _) = Invite::issue("b@example.com", Role::Talent, None, None, Duration::days(7), now);
        backend.invites().insert(&short).await.unwrap();
        backend.invites().insert(&long).await.unwrap();

        let expired = backend
            .invites()
            .expire_stale(now + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(expired, 1);
        let stored = backend.invites().get(short.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Expired);
        let counts = backend.invites().count_by_status().await.unwrap();
        assert_eq!(counts.get(&InviteStatus::Pending), Some(&1));
    }

    #[tokio::test]
    async fn test_talent_list_orders_featured_first() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let mut plain = TalentProfile::draft(Uuid::new_v4(), "Plain", now);
        plain.status = CurationStatus::Published;
        plain.updated_at = now + Duration::minutes(5);
        let mut featured = TalentProfile::draft(Uuid::new_v4(), "Featured", now);
        featured.status = CurationStatus::Published;
        featured.featured = true;
        let hidden = TalentProfile::draft(Uuid::new_v4(), "Draft", now);
        for p in [&plain, &featured, &hidden] {
            backend.talent().upsert(p).await.unwrap();
        }

        let listed = backend
            .talent()
            .list(&TalentFilter::published())
            .await
            .unwrap();
        let names: Vec<_> = listed.iter().map(|p| p.full_name.as_str()).collect();
        assert_eq!(names, vec!["Featured", "Plain"]);
    }

    #[tokio::test]
    async fn test_duplicate_pending_intro_rejected() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let founder = Uuid::new_v4();
        let talent = Uuid::new_v4();
        let mut first = IntroRequest::new(founder, talent, "hello there", now);
        backend.intros().insert(&first).await.unwrap();

        let second = IntroRequest::new(founder, talent, "hello again", now);
        assert!(backend.intros().insert(&second).await.unwrap_err().is_conflict());

        first
            .review(IntroDecision::Reject, Uuid::new_v4(), None, now)
            .unwrap();
        backend.intros().update(&first).await.unwrap();
        backend.intros().insert(&second).await.unwrap();
        assert_eq!(
            backend.intros().find_pending(founder, talent).await.unwrap().map(|i| i.id),
            Some(second.id)
        );
    }

    #[tokio::test]
    async fn test_second_review_from_stale_copy_is_rejected() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let intro = IntroRequest::new(Uuid::new_v4(), Uuid::new_v4(), "hello there", now);
        backend.intros().insert(&intro).await.unwrap();

        let mut first = backend.intros().get(intro.id).await.unwrap().unwrap();
        let mut second = backend.intros().get(intro.id).await.unwrap().unwrap();
        first
            .review(IntroDecision::Approve, Uuid::new_v4(), None, now)
            .unwrap();
        backend.intros().update(&first).await.unwrap();

        second
            .review(IntroDecision::Reject, Uuid::new_v4(), Some("no".to_string()), now)
            .unwrap();
        let err = backend.intros().update(&second).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale(_)));

        let stored = backend.intros().get(intro.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IntroStatus::Approved);
        assert!(matches!(
            backend.intros().delete_pending(intro.id).await.unwrap_err(),
            StorageError::Stale(_)
        ));
    }

    #[tokio::test]
    async fn test_stale_invite_copy_cannot_overwrite_revoke() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let (invite, _) = Invite::issue("a@example.com", Role::Talent, None, None, Duration::days(1), now);
        backend.invites().insert(&invite).await.unwrap();

        let mut stale = backend.invites().get(invite.id).await.unwrap().unwrap();
        let mut revoked = invite.clone();
        revoked.revoke(now).unwrap();
        backend.invites().update(&revoked).await.unwrap();

        stale.mark_used(Uuid::new_v4(), now).unwrap();
        let err = backend.invites().update(&stale).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale(_)));
        let stored = backend.invites().get(invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Revoked);
    }

    fn onboarding(invite: &Invite, now: DateTime<Utc>) -> Onboarding {
        let account = Account::new(&invite.email, invite.role, "New Person", "password123", now);
        let mut used = invite.clone();
        used.mark_used(account.id, now).unwrap();
        Onboarding {
            invite: used,
            profile: StarterProfile::Talent(TalentProfile::draft(account.id, "New Person", now)),
            account,
        }
    }

    #[tokio::test]
    async fn test_complete_onboarding_writes_everything() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let (invite, _) = Invite::issue("new@example.com", Role::Talent, None, None, Duration::days(1), now);
        backend.invites().insert(&invite).await.unwrap();

        let plan = onboarding(&invite, now);
        backend.complete_onboarding(&plan).await.unwrap();
        assert!(backend.accounts().get(plan.account.id).await.unwrap().is_some());
        assert!(backend.talent().get(plan.account.id).await.unwrap().is_some());
        let stored = backend.invites().get(invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Accepted);
    }

    #[tokio::test]
    async fn test_complete_onboarding_writes_nothing_on_failure() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let (invite, _) = Invite::issue("new@example.com", Role::Talent, None, None, Duration::days(1), now);
        backend.invites().insert(&invite).await.unwrap();
        let plan = onboarding(&invite, now);

        let mut revoked = invite.clone();
        revoked.revoke(now).unwrap();
        backend.invites().update(&revoked).await.unwrap();
        let err = backend.complete_onboarding(&plan).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale(_)));
        assert!(backend.accounts().find_by_email("new@example.com").await.unwrap().is_none());
        assert!(backend.talent().get(plan.account.id).await.unwrap().is_none());

        let (other, _) = Invite::issue("taken@example.com", Role::Talent, None, None, Duration::days(1), now);
        backend.invites().insert(&other).await.unwrap();
        backend
            .accounts()
            .insert(&account("taken@example.com", Role::Founder))
            .await
            .unwrap();
        let plan = onboarding(&other, now);
        assert!(backend.complete_onboarding(&plan).await.unwrap_err().is_conflict());
        assert!(backend.talent().get(plan.account.id).await.unwrap().is_none());
        let stored = backend.invites().get(other.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn test_skill_names_are_distinct_and_sorted() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let mut a = TalentProfile::draft(Uuid::new_v4(), "A", now);
        a.status = CurationStatus::Published;
        a.skills = vec!["rust".to_string(), "Go".to_string()];
        let mut b = TalentProfile::draft(Uuid::new_v4(), "B", now);
        b.status = CurationStatus::Published;
        b.skills = vec!["Rust".to_string(), "ansible".to_string()];
        let mut c = TalentProfile::draft(Uuid::new_v4(), "C", now);
        c.skills = vec!["Zig".to_string()];
        for p in [&a, &b, &c] {
            backend.talent().upsert(p).await.unwrap();
        }

        let published = backend
            .talent()
            .skill_names(&[CurationStatus::Published])
            .await
            .unwrap();
        assert_eq!(published.len(), 3);
        assert_eq!(published[0], "ansible");
        assert!(published[2].eq_ignore_ascii_case("rust"));
        assert_eq!(backend.talent().skill_names(&[]).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_tags_are_unique_and_attach_is_idempotent() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let senior = Tag::new("Senior", None, now);
        let remote = Tag::new("remote", Some("#336699".to_string()), now);
        backend.tags().insert(&senior).await.unwrap();
        backend.tags().insert(&remote).await.unwrap();
        assert!(backend
            .tags()
            .insert(&Tag::new("SENIOR", None, now))
            .await
            .unwrap_err()
            .is_conflict());

        let talent = Uuid::new_v4();
        backend.tags().attach(talent, senior.id).await.unwrap();
        backend.tags().attach(talent, senior.id).await.unwrap();
        backend.tags().attach(talent, remote.id).await.unwrap();
        let names: Vec<_> = backend
            .tags()
            .tags_for(talent)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["remote", "Senior"]);

        backend.tags().detach(talent, senior.id).await.unwrap();
        backend.tags().detach(talent, senior.id).await.unwrap();
        assert_eq!(backend.tags().tags_for(talent).await.unwrap().len(), 1);
        assert!(backend
            .tags()
            .attach(talent, Uuid::new_v4())
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_shortlist_upsert_replaces_entry() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let founder = Uuid::new_v4();
        let talent = Uuid::new_v4();
        let entry = ShortlistEntry::new(founder, talent, None, now);
        backend.shortlists().upsert(&entry).await.unwrap();
        let mut noted = entry.clone();
        noted.set_note(Some("strong systems background".to_string()), now);
        backend.shortlists().upsert(&noted).await.unwrap();

        let listed = backend.shortlists().list_for(founder).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].note.as_deref(), Some("strong systems background"));
        assert!(backend.shortlists().list_for(talent).await.unwrap().is_empty());

        backend.shortlists().remove(founder, talent).await.unwrap();
        backend.shortlists().remove(founder, talent).await.unwrap();
        assert!(backend.shortlists().get(founder, talent).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_rows_is_not_found() {
        let backend = MemoryBackend::new();
        let intro = IntroRequest::new(Uuid::new_v4(), Uuid::new_v4(), "hi", Utc::now());
        assert!(backend.intros().update(&intro).await.unwrap_err().is_not_found());
        let (invite, _) = Invite::issue("x@example.com", Role::Founder, None, None, Duration::days(1), Utc::now());
        assert!(backend.invites().update(&invite).await.unwrap_err().is_not_found());
        assert!(backend.intros().delete_pending(intro.id).await.unwrap_err().is_not_found());
        let role = PastRole::new(
            Uuid::new_v4(),
            crate::domain::RoleDetails {
                company_name: "Initech".to_string(),
                title: "Engineer".to_string(),
                start_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: None,
                description: None,
            },
            Utc::now(),
        );
        assert!(backend.past_roles().update(&role).await.unwrap_err().is_not_found());
        assert!(!backend.past_roles().delete(role.id).await.unwrap());
    }
}
