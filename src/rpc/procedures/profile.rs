//! `talent.*` and `founder.*` procedures

use async_trait::async_trait;

use super::IdInput;
use crate::domain::{FounderProfile, Role, TalentProfile};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::profiles::{
    self, CurateTalentInput, RateTalentInput, TalentDetail, UpdateFounderInput, UpdateTalentInput,
};
use crate::storage::TalentFilter;

const TALENT: Access = Access::Roles(&[Role::Talent]);
const FOUNDER: Access = Access::Roles(&[Role::Founder]);

pub struct TalentMe;

#[async_trait]
impl Procedure for TalentMe {
    const NAME: &'static str = "talent.me";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = TALENT;

    type Input = ();
    type Output = TalentProfile;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<TalentProfile> {
        profiles::get_own_talent(ctx.storage(), ctx.caller()?).await
    }
}

pub struct TalentUpdate;

#[async_trait]
impl Procedure for TalentUpdate {
    const NAME: &'static str = "talent.update";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = TALENT;

    type Input = UpdateTalentInput;
    type Output = TalentProfile;

    async fn call(&self, ctx: &Context, input: UpdateTalentInput) -> Result<TalentProfile> {
        profiles::update_own_talent(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct TalentList;

#[async_trait]
impl Procedure for TalentList {
    const NAME: &'static str = "talent.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Roles(&[Role::Admin, Role::Founder]);

    type Input = TalentFilter;
    type Output = Vec<TalentProfile>;

    async fn call(&self, ctx: &Context, input: TalentFilter) -> Result<Vec<TalentProfile>> {
        profiles::list_talent(ctx.storage(), ctx.caller()?, &input).await
    }
}

pub struct TalentGet;

#[async_trait]
impl Procedure for TalentGet {
    const NAME: &'static str = "talent.get";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Authenticated;

    type Input = IdInput;
    type Output = TalentDetail;

    async fn call(&self, ctx: &Context, input: IdInput) -> Result<TalentDetail> {
        profiles::talent_detail(ctx.storage(), ctx.caller()?, input.id).await
    }
}

pub struct TalentCurate;

#[async_trait]
impl Procedure for TalentCurate {
    const NAME: &'static str = "talent.curate";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Roles(&[Role::Admin]);

    type Input = CurateTalentInput;
    type Output = TalentProfile;

    async fn call(&self, ctx: &Context, input: CurateTalentInput) -> Result<TalentProfile> {
        profiles::curate_talent(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct TalentRate;

#[async_trait]
impl Procedure for TalentRate {
    const NAME: &'static str = "talent.rate";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Roles(&[Role::Admin]);

    type Input = RateTalentInput;
    type Output = TalentProfile;

    async fn call(&self, ctx: &Context, input: RateTalentInput) -> Result<TalentProfile> {
        profiles::rate_talent(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct SkillList;

#[async_trait]
impl Procedure for SkillList {
    const NAME: &'static str = "skill.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Authenticated;

    type Input = ();
    type Output = Vec<String>;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Vec<String>> {
        profiles::skill_catalog(ctx.storage(), ctx.caller()?).await
    }
}

pub struct FounderMe;

#[async_trait]
impl Procedure for FounderMe {
    const NAME: &'static str = "founder.me";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = FOUNDER;

    type Input = ();
    type Output = FounderProfile;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<FounderProfile> {
        profiles::get_own_founder(ctx.storage(), ctx.caller()?).await
    }
}

pub struct FounderUpdate;

#[async_trait]
impl Procedure for FounderUpdate {
    const NAME: &'static str = "founder.update";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = FOUNDER;

    type Input = UpdateFounderInput;
    type Output = FounderProfile;

    async fn call(&self, ctx: &Context, input: UpdateFounderInput) -> Result<FounderProfile> {
        profiles::update_own_founder(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}
