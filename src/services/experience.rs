//! Past roles on a talent's own profile

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Caller, PastRole, Role, RoleDetails};
use crate::error::{MarketError, Result};
use crate::services::require_role;
use crate::storage::MarketplaceStorage;
use crate::validation::{self, Validate, ValidationErrors};

const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_PAST_ROLES: usize = 30;

impl Validate for RoleDetails {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("company_name", validation::length(&self.company_name, 1, 120));
        errors.check("title", validation::length(&self.title, 1, 120));
        errors.check(
            "description",
            validation::optional_length(self.description.as_deref(), MAX_DESCRIPTION_LEN),
        );
        if self.end_date.is_some_and(|end| end < self.start_date) {
            errors.add("end_date", "must not be before the start date");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePastRoleInput {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: RoleDetails,
}

impl Validate for UpdatePastRoleInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.details.validate()
    }
}

fn past_role_not_found() -> MarketError {
    MarketError::profile_not_found("past role not found")
}

/// Another talent's role reads as missing
async fn load_own(storage: &dyn MarketplaceStorage, talent: &Caller, id: Uuid) -> Result<PastRole> {
    storage
        .past_roles()
        .get(id)
        .await?
        .filter(|r| r.talent_id == talent.account_id)
        .ok_or_else(past_role_not_found)
}

pub async fn list_own_roles(
    storage: &dyn MarketplaceStorage,
    talent: &Caller,
) -> Result<Vec<PastRole>> {
    require_role(talent, Role::Talent)?;
    Ok(storage.past_roles().list_for(talent.account_id).await?)
}

pub async fn add_role(
    storage: &dyn MarketplaceStorage,
    talent: &Caller,
    details: &RoleDetails,
    now: DateTime<Utc>,
) -> Result<PastRole> {
    require_role(talent, Role::Talent)?;
    let existing = storage.past_roles().list_for(talent.account_id).await?;
    if existing.len() >= MAX_PAST_ROLES {
        let mut errors = ValidationErrors::new();
        errors.add("company_name", format!("at most {} past roles", MAX_PAST_ROLES));
        return Err(errors.into());
    }

    let role = PastRole::new(talent.account_id, details.clone(), now);
    storage.past_roles().insert(&role).await?;
    info!(role_id = %role.id, account_id = %talent.account_id, "Past role added");
    Ok(role)
}

pub async fn update_role(
    storage: &dyn MarketplaceStorage,
    talent: &Caller,
    input: &UpdatePastRoleInput,
    now: DateTime<Utc>,
) -> Result<PastRole> {
    require_role(talent, Role::Talent)?;
    let mut role = load_own(storage, talent, input.id).await?;
    role.apply(input.details.clone(), now);
    storage.past_roles().update(&role).await?;
    info!(role_id = %role.id, "Past role updated");
    Ok(role)
}

pub async fn delete_role(
    storage: &dyn MarketplaceStorage,
    talent: &Caller,
    id: Uuid,
) -> Result<()> {
    require_role(talent, Role::Talent)?;
    load_own(storage, talent, id).await?;
    if !storage.past_roles().delete(id).await? {
        return Err(past_role_not_found());
    }
    info!(role_id = %id, "Past role deleted");
    Ok(())
}
