//! Filter and status types shared by storage backends

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    Account, Availability, CurationStatus, FounderProfile, IntroStatus, Invite, InviteStatus, Role,
    TalentProfile,
};

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

/// Offset pagination; `limit` is clamped to `1..=MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Apply this page to an already-ordered iterator
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.clamped_limit())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteFilter {
    pub status: Option<InviteStatus>,
    pub email: Option<String>,
    #[serde(default)]
    pub page: Page,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentFilter {
    /// Empty means every status
    #[serde(default)]
    pub statuses: Vec<CurationStatus>,
    pub skill: Option<String>,
    pub query: Option<String>,
    pub availability: Option<Availability>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub page: Page,
}

impl TalentFilter {
    pub fn published() -> Self {
        Self {
            statuses: vec![CurationStatus::Published],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroFilter {
    pub founder_id: Option<Uuid>,
    pub talent_id: Option<Uuid>,
    pub status: Option<IntroStatus>,
    #[serde(default)]
    pub page: Page,
}

/// Backend health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub backend_type: String,
    pub latency_ms: u64,
    pub errors: Vec<String>,
}

/// Row counts grouped by a key
pub type RoleCounts = HashMap<Role, usize>;
pub type CurationCounts = HashMap<CurationStatus, usize>;
pub type InviteCounts = HashMap<InviteStatus, usize>;
pub type IntroCounts = HashMap<IntroStatus, usize>;

/// Profile created alongside a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarterProfile {
    Talent(TalentProfile),
    Founder(FounderProfile),
    None,
}

/// Writes made when an invite is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Onboarding {
    /// Already marked used
    pub invite: Invite,
    pub account: Account,
    pub profile: StarterProfile,
}
