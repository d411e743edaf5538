//! Founder shortlists

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Caller, CurationStatus, Role, ShortlistEntry, TalentProfile};
use crate::error::{MarketError, Result};
use crate::services::require_role;
use crate::storage::MarketplaceStorage;
use crate::validation::{self, Validate, ValidationErrors};

const MAX_NOTE_LEN: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ShortlistInput {
    pub talent_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for ShortlistInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("note", validation::optional_length(self.note.as_deref(), MAX_NOTE_LEN));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TalentIdInput {
    pub talent_id: Uuid,
}

impl Validate for TalentIdInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

/// A shortlist entry with the talent's public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortlistView {
    #[serde(flatten)]
    pub entry: ShortlistEntry,
    pub talent: TalentProfile,
}

fn not_shortlisted() -> MarketError {
    MarketError::profile_not_found("talent is not on your shortlist")
}

/// Add a published talent, or update the note of an existing entry. An
/// absent note keeps the one already saved.
pub async fn add_to_shortlist(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    input: &ShortlistInput,
    now: DateTime<Utc>,
) -> Result<ShortlistEntry> {
    require_role(founder, Role::Founder)?;
    let visible = storage
        .talent()
        .get(input.talent_id)
        .await?
        .is_some_and(|p| p.status == CurationStatus::Published);
    if !visible {
        return Err(MarketError::profile_not_found("talent profile not found"));
    }

    let note = validation::blank_to_none(input.note.clone());
    let entry = match storage
        .shortlists()
        .get(founder.account_id, input.talent_id)
        .await?
    {
        Some(mut entry) => {
            if note.is_some() {
                entry.set_note(note, now);
            }
            entry
        }
        None => ShortlistEntry::new(founder.account_id, input.talent_id, note, now),
    };
    storage.shortlists().upsert(&entry).await?;
    info!(talent_id = %input.talent_id, "Talent shortlisted");
    Ok(entry)
}

/// Idempotent
pub async fn remove_from_shortlist(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    talent_id: Uuid,
) -> Result<()> {
    require_role(founder, Role::Founder)?;
    storage
        .shortlists()
        .remove(founder.account_id, talent_id)
        .await?;
    debug!(talent_id = %talent_id, "Talent removed from shortlist");
    Ok(())
}

/// Replace the note on an existing entry; a blank note clears it
pub async fn update_note(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    input: &ShortlistInput,
    now: DateTime<Utc>,
) -> Result<ShortlistEntry> {
    require_role(founder, Role::Founder)?;
    let mut entry = storage
        .shortlists()
        .get(founder.account_id, input.talent_id)
        .await?
        .ok_or_else(not_shortlisted)?;
    entry.set_note(validation::blank_to_none(input.note.clone()), now);
    storage.shortlists().upsert(&entry).await?;
    Ok(entry)
}

/// Newest first. Talent no longer published drop out of the view but keep
/// their entry, so they reappear if republished.
pub async fn my_shortlist(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
) -> Result<Vec<ShortlistView>> {
    require_role(founder, Role::Founder)?;
    let entries = storage.shortlists().list_for(founder.account_id).await?;
    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
        match storage.talent().get(entry.talent_id).await? {
            Some(profile) if profile.status == CurationStatus::Published => views.push(ShortlistView {
                talent: profile.public_view(),
                entry,
            }),
            _ => {}
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcErrorCode;
    use crate::services::fixtures::{account, now};
    use crate::storage::MemoryBackend;
    use chrono::Duration;

    async fn published(storage: &MemoryBackend, email: &str) -> Uuid {
        let talent = account(storage, email, Role::Talent).await;
        let mut profile = TalentProfile::draft(talent.account_id, email, now());
        profile.status = CurationStatus::Published;
        profile.admin_notes = Some("internal".to_string());
        profile.internal_rating = Some(5);
        storage.talent().upsert(&profile).await.unwrap();
        talent.account_id
    }

    fn input(talent_id: Uuid, note: Option<&str>) -> ShortlistInput {
        ShortlistInput {
            talent_id,
            note: note.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_shortlist_lifecycle() {
        let storage = MemoryBackend::new();
        let founder = account(&storage, "founder@example.com", Role::Founder).await;
        let first = published(&storage, "first@example.com").await;
        let second = published(&storage, "second@example.com").await;

        add_to_shortlist(&storage, &founder, &input(first, Some("great fit")), now())
            .await
            .unwrap();
        add_to_shortlist(&storage, &founder, &input(second, None), now() + Duration::minutes(1))
            .await
            .unwrap();
        // Re-adding without a note keeps the saved one
        add_to_shortlist(&storage, &founder, &input(first, None), now())
            .await
            .unwrap();

        let list = my_shortlist(&storage, &founder).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].entry.talent_id, second);
        assert_eq!(list[1].entry.note.as_deref(), Some("great fit"));
        assert_eq!(list[1].talent.admin_notes, None);
        assert_eq!(list[1].talent.internal_rating, None);

        update_note(&storage, &founder, &input(first, Some("  ")), now())
            .await
            .unwrap();
        remove_from_shortlist(&storage, &founder, second).await.unwrap();
        remove_from_shortlist(&storage, &founder, second).await.unwrap();
        let list = my_shortlist(&storage, &founder).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].entry.note, None);

        let err = update_note(&storage, &founder, &input(second, Some("x")), now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_only_published_talent_can_be_shortlisted() {
        let storage = MemoryBackend::new();
        let founder = account(&storage, "founder@example.com", Role::Founder).await;
        let talent = account(&storage, "draft@example.com", Role::Talent).await;
        storage
            .talent()
            .upsert(&TalentProfile::draft(talent.account_id, "Draft", now()))
            .await
            .unwrap();

        let err = add_to_shortlist(&storage, &founder, &input(talent.account_id, None), now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = add_to_shortlist(&storage, &talent, &input(talent.account_id, None), now())
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), RpcErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_hidden_talent_drop_out_of_view() {
        let storage = MemoryBackend::new();
        let founder = account(&storage, "founder@example.com", Role::Founder).await;
        let talent = published(&storage, "soon-hidden@example.com").await;
        add_to_shortlist(&storage, &founder, &input(talent, None), now())
            .await
            .unwrap();

        let mut profile = storage.talent().get(talent).await.unwrap().unwrap();
        profile.status = CurationStatus::Hidden;
        storage.talent().upsert(&profile).await.unwrap();
        assert!(my_shortlist(&storage, &founder).await.unwrap().is_empty());
        assert!(storage
            .shortlists()
            .get(founder.account_id, talent)
            .await
            .unwrap()
            .is_some());
    }
}
