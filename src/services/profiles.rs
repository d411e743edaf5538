//! Talent and founder profiles, plus admin curation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Availability, Caller, CurationStatus, FounderProfile, PastRole, Role, Tag, TalentProfile,
    MAX_RATING, MIN_RATING,
};
use crate::error::{MarketError, Result};
use crate::services::require_role;
use crate::storage::{MarketplaceStorage, TalentFilter};
use crate::validation::{self, Validate, ValidationErrors};

const MAX_BIO_LEN: usize = 4000;
const MAX_NOTES_LEN: usize = 2000;
const MAX_QUERY_LEN: usize = 100;

/// Fields a talent may edit on their own profile
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTalentInput {
    pub full_name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    pub skills: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<u16>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub availability: Availability,
}

impl Validate for UpdateTalentInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("full_name", validation::length(&self.full_name, 1, 120));
        errors.check("headline", validation::length(&self.headline, 0, 160));
        errors.check("bio", validation::length(&self.bio, 0, MAX_BIO_LEN));
        errors.check("location", validation::length(&self.location, 0, 120));
        errors.check("skills", validation::skills(&self.skills));
        if self.years_experience.is_some_and(|y| y > 70) {
            errors.add("years_experience", "must be at most 70");
        }
        errors.check("linkedin_url", validation::optional_url(self.linkedin_url.as_deref()));
        errors.check("github_url", validation::optional_url(self.github_url.as_deref()));
        errors.check("portfolio_url", validation::optional_url(self.portfolio_url.as_deref()));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFounderInput {
    pub full_name: String,
    pub company_name: String,
    #[serde(default)]
    pub company_url: Option<String>,
    #[serde(default)]
    pub role_title: Option<String>,
    #[serde(default)]
    pub bio: String,
}

impl Validate for UpdateFounderInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("full_name", validation::length(&self.full_name, 1, 120));
        errors.check("company_name", validation::length(&self.company_name, 1, 120));
        errors.check("company_url", validation::optional_url(self.company_url.as_deref()));
        errors.check("role_title", validation::optional_length(self.role_title.as_deref(), 120));
        errors.check("bio", validation::length(&self.bio, 0, MAX_BIO_LEN));
        errors.into_result()
    }
}

/// Admin-only changes. Absent fields are left untouched; an empty
/// `admin_notes` clears the notes.
#[derive(Debug, Clone, Deserialize)]
pub struct CurateTalentInput {
    pub id: Uuid,
    #[serde(default)]
    pub status: Option<CurationStatus>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl Validate for CurateTalentInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            "admin_notes",
            validation::optional_length(self.admin_notes.as_deref(), MAX_NOTES_LEN),
        );
        errors.into_result()
    }
}

/// Set or clear the internal 1-5 rating
#[derive(Debug, Clone, Deserialize)]
pub struct RateTalentInput {
    pub id: Uuid,
    #[serde(default)]
    pub rating: Option<u8>,
}

impl Validate for RateTalentInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self
            .rating
            .is_some_and(|r| !(MIN_RATING..=MAX_RATING).contains(&r))
        {
            errors.add(
                "rating",
                format!("must be between {} and {}", MIN_RATING, MAX_RATING),
            );
        }
        errors.into_result()
    }
}

/// A profile with its work history. Tags are only filled in for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TalentDetail {
    #[serde(flatten)]
    pub profile: TalentProfile,
    pub past_roles: Vec<PastRole>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Validate for TalentFilter {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("query", validation::optional_length(self.query.as_deref(), MAX_QUERY_LEN));
        errors.check(
            "skill",
            validation::optional_length(self.skill.as_deref(), validation::MAX_SKILL_LEN),
        );
        errors.into_result()
    }
}

fn talent_not_found() -> MarketError {
    MarketError::profile_not_found("talent profile not found")
}

pub async fn get_own_talent(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
) -> Result<TalentProfile> {
    require_role(caller, Role::Talent)?;
    storage
        .talent()
        .get(caller.account_id)
        .await?
        .map(|p| p.public_view())
        .ok_or_else(talent_not_found)
}

pub async fn update_own_talent(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
    input: &UpdateTalentInput,
    now: DateTime<Utc>,
) -> Result<TalentProfile> {
    require_role(caller, Role::Talent)?;
    let mut profile = storage
        .talent()
        .get(caller.account_id)
        .await?
        .unwrap_or_else(|| TalentProfile::draft(caller.account_id, &input.full_name, now));

    profile.full_name = input.full_name.trim().to_string();
    profile.headline = input.headline.trim().to_string();
    profile.bio = input.bio.trim().to_string();
    profile.location = input.location.trim().to_string();
    profile.skills = validation::normalize_skills(&input.skills);
    profile.years_experience = input.years_experience;
    profile.linkedin_url = validation::blank_to_none(input.linkedin_url.clone());
    profile.github_url = validation::blank_to_none(input.github_url.clone());
    profile.portfolio_url = validation::blank_to_none(input.portfolio_url.clone());
    profile.availability = input.availability;
    profile.updated_at = now;

    storage.talent().upsert(&profile).await?;
    info!(account_id = %caller.account_id, "Talent profile updated");
    Ok(profile.public_view())
}

pub async fn get_own_founder(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
) -> Result<FounderProfile> {
    require_role(caller, Role::Founder)?;
    storage
        .founders()
        .get(caller.account_id)
        .await?
        .ok_or_else(|| MarketError::profile_not_found("founder profile not found"))
}

pub async fn update_own_founder(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
    input: &UpdateFounderInput,
    now: DateTime<Utc>,
) -> Result<FounderProfile> {
    require_role(caller, Role::Founder)?;
    let mut profile = storage
        .founders()
        .get(caller.account_id)
        .await?
        .unwrap_or_else(|| FounderProfile::empty(caller.account_id, &input.full_name, now));

    profile.full_name = input.full_name.trim().to_string();
    profile.company_name = input.company_name.trim().to_string();
    profile.company_url = validation::blank_to_none(input.company_url.clone());
    profile.role_title = validation::blank_to_none(input.role_title.clone());
    profile.bio = input.bio.trim().to_string();
    profile.updated_at = now;

    storage.founders().upsert(&profile).await?;
    info!(account_id = %caller.account_id, "Founder profile updated");
    Ok(profile)
}

/// Browse talent. Founders only ever see published profiles and never see
/// admin notes.
pub async fn list_talent(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
    filter: &TalentFilter,
) -> Result<Vec<TalentProfile>> {
    let mut filter = filter.clone();
    match caller.role {
        Role::Admin => {}
        Role::Founder => filter.statuses = vec![CurationStatus::Published],
        Role::Talent => return Err(MarketError::forbidden("talent cannot browse profiles")),
    }

    let profiles = storage.talent().list(&filter).await?;
    Ok(match caller.role {
        Role::Admin => profiles,
        _ => profiles.iter().map(TalentProfile::public_view).collect(),
    })
}

/// A single profile. Hidden and draft profiles read as missing for founders.
pub async fn get_talent(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
    id: Uuid,
) -> Result<TalentProfile> {
    let profile = storage.talent().get(id).await?.ok_or_else(talent_not_found)?;

    let own = caller.role == Role::Talent && caller.account_id == id;
    if caller.role == Role::Admin {
        Ok(profile)
    } else if own || profile.status.visible_to(caller.role) {
        Ok(profile.public_view())
    } else {
        Err(talent_not_found())
    }
}

pub async fn talent_detail(
    storage: &dyn MarketplaceStorage,
    caller: &Caller,
    id: Uuid,
) -> Result<TalentDetail> {
    let profile = get_talent(storage, caller, id).await?;
    let past_roles = storage.past_roles().list_for(id).await?;
    let tags = if caller.role == Role::Admin {
        storage.tags().tags_for(id).await?
    } else {
        Vec::new()
    };
    Ok(TalentDetail {
        profile,
        past_roles,
        tags,
    })
}

/// Distinct skill names for suggestions. Admins see skills from every
/// profile, everyone else only from published ones.
pub async fn skill_catalog(storage: &dyn MarketplaceStorage, caller: &Caller) -> Result<Vec<String>> {
    let statuses = match caller.role {
        Role::Admin => Vec::new(),
        _ => vec![CurationStatus::Published],
    };
    Ok(storage.talent().skill_names(&statuses).await?)
}

pub async fn rate_talent(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &RateTalentInput,
    now: DateTime<Utc>,
) -> Result<TalentProfile> {
    require_role(admin, Role::Admin)?;
    let mut profile = storage
        .talent()
        .get(input.id)
        .await?
        .ok_or_else(talent_not_found)?;
    profile.internal_rating = input.rating;
    profile.updated_at = now;
    storage.talent().upsert(&profile).await?;
    info!(account_id = %profile.account_id, rating = ?input.rating, "Talent rated");
    Ok(profile)
}

pub async fn curate_talent(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &CurateTalentInput,
    now: DateTime<Utc>,
) -> Result<TalentProfile> {
    require_role(admin, Role::Admin)?;
    let mut profile = storage
        .talent()
        .get(input.id)
        .await?
        .ok_or_else(talent_not_found)?;

    if let Some(status) = input.status {
        profile.status = status;
    }
    if let Some(featured) = input.featured {
        profile.featured = featured;
    }
    if input.admin_notes.is_some() {
        profile.admin_notes = validation::blank_to_none(input.admin_notes.clone());
    }
    profile.updated_at = now;

    storage.talent().upsert(&profile).await?;
    info!(
        account_id = %profile.account_id,
        status = %profile.status,
        featured = profile.featured,
        "Talent profile curated"
    );
    Ok(profile)
}
