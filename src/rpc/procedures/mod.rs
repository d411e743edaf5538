//! Every procedure exposed under `/api/rpc/{name}`

pub mod admin;
pub mod auth;
pub mod experience;
pub mod intro;
pub mod invite;
pub mod profile;
pub mod shortlist;
pub mod tag;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProcedureRegistry;
use crate::error::Result;
use crate::validation::{self, Validate, ValidationErrors};

/// Input naming a single row
#[derive(Debug, Clone, Deserialize)]
pub struct IdInput {
    pub id: Uuid,
}

impl Validate for IdInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub token: String,
}

impl Validate for TokenInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("token", validation::length(&self.token, 1, 128));
        errors.into_result()
    }
}

/// Output of procedures that only succeed or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

pub fn register_all(registry: &mut ProcedureRegistry) -> Result<()> {
    registry.register(auth::SignIn)?;
    registry.register(auth::SignOut)?;
    registry.register(auth::Me)?;

    registry.register(invite::Create)?;
    registry.register(invite::List)?;
    registry.register(invite::Revoke)?;
    registry.register(invite::Verify)?;
    registry.register(invite::Accept)?;

    registry.register(profile::TalentMe)?;
    registry.register(profile::TalentUpdate)?;
    registry.register(profile::TalentList)?;
    registry.register(profile::TalentGet)?;
    registry.register(profile::TalentCurate)?;
    registry.register(profile::TalentRate)?;
    registry.register(profile::SkillList)?;
    registry.register(profile::FounderMe)?;
    registry.register(profile::FounderUpdate)?;

    registry.register(intro::Create)?;
    registry.register(intro::Mine)?;
    registry.register(intro::ForTalent)?;
    registry.register(intro::List)?;
    registry.register(intro::Review)?;
    registry.register(intro::Cancel)?;

    registry.register(experience::List)?;
    registry.register(experience::Add)?;
    registry.register(experience::Update)?;
    registry.register(experience::Delete)?;

    registry.register(shortlist::Add)?;
    registry.register(shortlist::Remove)?;
    registry.register(shortlist::Mine)?;
    registry.register(shortlist::UpdateNote)?;

    registry.register(tag::Create)?;
    registry.register(tag::List)?;
    registry.register(tag::Attach)?;
    registry.register(tag::Detach)?;

    registry.register(admin::Stats)?;
    registry.register(admin::Accounts)?;
    Ok(())
}
