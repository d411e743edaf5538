//! Founder shortlists of talent they are considering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One talent on one founder's shortlist. The pair is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub founder_id: Uuid,
    pub talent_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortlistEntry {
    pub fn new(founder_id: Uuid, talent_id: Uuid, note: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            founder_id,
            talent_id,
            note,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_note(&mut self, note: Option<String>, now: DateTime<Utc>) {
        self.note = note;
        self.updated_at = now;
    }
}
