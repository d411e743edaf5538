//! Introduction requests from founders to talent
//!
//! `pending -> approved | rejected`. Both outcomes are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorCode, MarketError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntroStatus {
    Pending,
    Approved,
    Rejected,
}

/// Admin decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntroDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("intro request is already {from} and cannot be {attempted}")]
pub struct TransitionError {
    pub from: IntroStatus,
    pub attempted: IntroStatus,
}

impl From<TransitionError> for MarketError {
    fn from(err: TransitionError) -> Self {
        MarketError::intro(ErrorCode::INTRO_INVALID_TRANSITION, err.to_string())
    }
}

impl IntroStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn transition(self, decision: IntroDecision) -> Result<IntroStatus, TransitionError> {
        let target = match decision {
            IntroDecision::Approve => Self::Approved,
            IntroDecision::Reject => Self::Rejected,
        };
        match self {
            Self::Pending => Ok(target),
            from => Err(TransitionError {
                from,
                attempted: target,
            }),
        }
    }
}

impl fmt::Display for IntroStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntroStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown intro status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroRequest {
    pub id: Uuid,
    pub founder_id: Uuid,
    pub talent_id: Uuid,
    pub message: String,
    pub status: IntroStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub decision_note: Option<String>,
}

impl IntroRequest {
    pub fn new(founder_id: Uuid, talent_id: Uuid, message: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            founder_id,
            talent_id,
            message: message.trim().to_string(),
            status: IntroStatus::Pending,
            created_at: now,
            reviewed_at: None,
            reviewed_by: None,
            decision_note: None,
        }
    }

    pub fn review(
        &mut self,
        decision: IntroDecision,
        reviewer: Uuid,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition(decision)?;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer);
        self.decision_note = note;
        Ok(())
    }
}
