//! Invite token lifecycle
//!
//! An invite is issued by an admin for one email and role. The clear token is
//! handed out once; only its hash is persisted. Lifecycle:
//!
//! ```text
//! pending --accept--> accepted
//!    |  \--revoke---> revoked
//!     \--expires_at-> expired
//! ```
//!
//! Expiry is evaluated lazily: a stored `pending` invite whose `expires_at`
//! has passed reads as `expired` everywhere.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::account::{expiry, generate_token, hash_token};
use super::Role;
use crate::error::{ErrorCode, MarketError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!("unknown invite status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InviteError {
    #[error("invite has expired")]
    Expired,
    #[error("invite has already been used")]
    AlreadyUsed,
    #[error("invite was revoked")]
    Revoked,
}

impl From<InviteError> for MarketError {
    fn from(err: InviteError) -> Self {
        let code = match err {
            InviteError::Expired => ErrorCode::INVITE_EXPIRED,
            InviteError::AlreadyUsed => ErrorCode::INVITE_ALREADY_USED,
            InviteError::Revoked => ErrorCode::INVITE_REVOKED,
        };
        MarketError::invite(code, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub token_hash: String,
    pub status: InviteStatus,
    pub invited_by: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_account_id: Option<Uuid>,
}

impl Invite {
    /// Issue a new pending invite. Returns the invite and its clear token.
    pub fn issue(
        email: &str,
        role: Role,
        invited_by: Option<Uuid>,
        note: Option<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> (Self, String) {
        let token = generate_token();
        let invite = Self {
            id: Uuid::new_v4(),
            email: crate::validation::normalize_email(email),
            role,
            token_hash: hash_token(&token),
            status: InviteStatus::Pending,
            invited_by,
            note,
            created_at: now,
            expires_at: expiry(now, ttl),
            accepted_at: None,
            accepted_account_id: None,
        };
        (invite, token)
    }

    /// Status as observed at `now`, with lazy expiry applied
    pub fn effective_status(&self, now: DateTime<Utc>) -> InviteStatus {
        match self.status {
            InviteStatus::Pending if self.expires_at <= now => InviteStatus::Expired,
            status => status,
        }
    }

    /// True when the stored status lags behind the effective one
    pub fn needs_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && self.effective_status(now) == InviteStatus::Expired
    }

    pub fn check_acceptable(&self, now: DateTime<Utc>) -> Result<(), InviteError> {
        match self.effective_status(now) {
            InviteStatus::Pending => Ok(()),
            InviteStatus::Accepted => Err(InviteError::AlreadyUsed),
            InviteStatus::Expired => Err(InviteError::Expired),
            InviteStatus::Revoked => Err(InviteError::Revoked),
        }
    }

    /// pending -> accepted. The token can never be used again afterwards.
    pub fn mark_used(&mut self, account_id: Uuid, now: DateTime<Utc>) -> Result<(), InviteError> {
        self.check_acceptable(now)?;
        self.status = InviteStatus::Accepted;
        self.accepted_at = Some(now);
        self.accepted_account_id = Some(account_id);
        Ok(())
    }

    /// Persistable pending -> expired transition; a no-op for other states
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.needs_expiry(now) {
            self.status = InviteStatus::Expired;
            true
        } else {
            false
        }
    }

    /// pending -> revoked
    pub fn revoke(&mut self, now: DateTime<Utc>) -> Result<(), InviteError> {
        self.check_acceptable(now)?;
        self.status = InviteStatus::Revoked;
        Ok(())
    }

    pub fn matches_token(&self, token: &str) -> bool {
        self.token_hash == hash_token(token)
    }
}
