//! Effectful marketplace operations
//!
//! Each operation performs one or two storage reads/writes on top of the pure
//! rules in [`crate::domain`]. Ownership and role checks live here, so the
//! procedure and page layers cannot bypass them.

pub mod admin;
pub mod auth;
pub mod experience;
pub mod intros;
pub mod invites;
pub mod profiles;
pub mod shortlist;
pub mod tags;

use crate::domain::{Caller, Role};
use crate::error::{MarketError, Result};

pub use admin::{AccountSummary, DashboardStats, ListAccountsInput};
pub use auth::{SignInInput, SignedIn};
pub use experience::UpdatePastRoleInput;
pub use intros::{CreateIntroInput, IntroView, ReviewIntroInput};
pub use invites::{AcceptInviteInput, CreateInviteInput, IssuedInvite, InviteSummary};
pub use profiles::{
    CurateTalentInput, RateTalentInput, TalentDetail, UpdateFounderInput, UpdateTalentInput,
};
pub use shortlist::{ShortlistInput, ShortlistView, TalentIdInput};
pub use tags::{CreateTagInput, TalentTagInput};

/// Fail with `FORBIDDEN` unless the caller holds `role`
pub fn require_role(caller: &Caller, role: Role) -> Result<()> {
    if caller.role == role {
        Ok(())
    } else {
        Err(MarketError::forbidden(format!(
            "this action requires the {} role",
            role
        )))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::{Account, Caller, Role};
    use crate::storage::{MarketplaceStorage, MemoryBackend};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    pub async fn account(storage: &MemoryBackend, email: &str, role: Role) -> Caller {
        let account = Account::new(email, role, email, "correct horse battery", now());
        storage.accounts().insert(&account).await.unwrap();
        account.caller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_require_role() {
        let caller = Caller {
            account_id: Uuid::new_v4(),
            email: "f@example.com".to_string(),
            role: Role::Founder,
            display_name: "F".to_string(),
        };
        assert!(require_role(&caller, Role::Founder).is_ok());
        let err = require_role(&caller, Role::Admin).unwrap_err();
        assert_eq!(err.rpc_code(), crate::error::RpcErrorCode::Forbidden);
    }
}
