//! Admin tags on talent profiles

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Caller, Role, Tag};
use crate::error::{codes::ErrorCode, MarketError, Result};
use crate::services::require_role;
use crate::storage::{MarketplaceStorage, StorageError};
use crate::validation::{self, Validate, ValidationErrors};

pub const MAX_TAG_NAME_LEN: usize = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagInput {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Validate for CreateTagInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validation::length(&self.name, 1, MAX_TAG_NAME_LEN));
        errors.check("color", validation::optional_color(self.color.as_deref()));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TalentTagInput {
    pub talent_id: Uuid,
    pub tag_id: Uuid,
}

impl Validate for TalentTagInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

pub async fn create_tag(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &CreateTagInput,
    now: DateTime<Utc>,
) -> Result<Tag> {
    require_role(admin, Role::Admin)?;
    let tag = Tag::new(&input.name, input.color.clone(), now);
    match storage.tags().insert(&tag).await {
        Ok(()) => {}
        Err(StorageError::Conflict(_)) => {
            return Err(MarketError::profile(
                ErrorCode::PROFILE_TAG_EXISTS,
                format!("a tag named {} already exists", tag.name),
            ));
        }
        Err(e) => return Err(e.into()),
    }
    info!(tag_id = %tag.id, name = %tag.name, "Tag created");
    Ok(tag)
}

pub async fn list_tags(storage: &dyn MarketplaceStorage, admin: &Caller) -> Result<Vec<Tag>> {
    require_role(admin, Role::Admin)?;
    Ok(storage.tags().list().await?)
}

/// Idempotent; the profile and the tag must both exist
pub async fn tag_talent(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &TalentTagInput,
) -> Result<()> {
    require_role(admin, Role::Admin)?;
    if storage.talent().get(input.talent_id).await?.is_none() {
        return Err(MarketError::profile_not_found("talent profile not found"));
    }
    storage.tags().attach(input.talent_id, input.tag_id).await?;
    info!(talent_id = %input.talent_id, tag_id = %input.tag_id, "Talent tagged");
    Ok(())
}

/// Idempotent
pub async fn untag_talent(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &TalentTagInput,
) -> Result<()> {
    require_role(admin, Role::Admin)?;
    storage.tags().detach(input.talent_id, input.tag_id).await?;
    info!(talent_id = %input.talent_id, tag_id = %input.tag_id, "Talent untagged");
    Ok(())
}
