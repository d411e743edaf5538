use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Role;

/// Admin curation state of a talent profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurationStatus {
    Draft,
    Published,
    Hidden,
}

impl CurationStatus {
    pub const ALL: [CurationStatus; 3] = [Self::Draft, Self::Published, Self::Hidden];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Hidden => "hidden",
        }
    }

    /// Whether a caller of `role` may see a profile in this state. Talent only
    /// ever see their own profile, which is checked by ownership elsewhere.
    pub fn visible_to(self, role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::Founder => self == Self::Published,
            Role::Talent => false,
        }
    }
}

impl fmt::Display for CurationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "hidden" => Ok(Self::Hidden),
            other => Err(format!("unknown curation status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Open,
    Passive,
    Unavailable,
}

impl Availability {
    pub const ALL: [Availability; 3] = [Self::Open, Self::Passive, Self::Unavailable];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Passive => "passive",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "passive" => Ok(Self::Passive),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(format!("unknown availability '{}'", other)),
        }
    }
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentProfile {
    pub account_id: Uuid,
    pub full_name: String,
    pub headline: String,
    pub bio: String,
    pub location: String,
    pub skills: Vec<String>,
    pub years_experience: Option<u16>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub availability: Availability,
    pub status: CurationStatus,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    /// Admin-only score from 1 to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TalentProfile {
    /// Empty draft created when a talent accepts an invite
    pub fn draft(account_id: Uuid, full_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            full_name: full_name.trim().to_string(),
            headline: String::new(),
            bio: String::new(),
            location: String::new(),
            skills: Vec::new(),
            years_experience: None,
            linkedin_url: None,
            github_url: None,
            portfolio_url: None,
            availability: Availability::Open,
            status: CurationStatus::Draft,
            featured: false,
            admin_notes: None,
            internal_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy with admin-only fields removed
    pub fn public_view(&self) -> Self {
        Self {
            admin_notes: None,
            internal_rating: None,
            ..self.clone()
        }
    }

    /// Case-insensitive match against name, headline, bio, location and skills
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.full_name, &self.headline, &self.bio, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
            || self
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&needle))
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        let skill = skill.trim();
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FounderProfile {
    pub account_id: Uuid,
    pub full_name: String,
    pub company_name: String,
    pub company_url: Option<String>,
    pub role_title: Option<String>,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FounderProfile {
    pub fn empty(account_id: Uuid, full_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            full_name: full_name.trim().to_string(),
            company_name: String::new(),
            company_url: None,
            role_title: None,
            bio: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
