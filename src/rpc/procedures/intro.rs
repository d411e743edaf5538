//! `intro.*` procedures

use async_trait::async_trait;

use super::{Ack, IdInput};
use crate::domain::{IntroRequest, Role};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::intros::{self, CreateIntroInput, IntroView, ReviewIntroInput};
use crate::storage::{IntroFilter, Page};

const ADMIN: Access = Access::Roles(&[Role::Admin]);

pub struct Create;

#[async_trait]
impl Procedure for Create {
    const NAME: &'static str = "intro.create";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Roles(&[Role::Founder]);

    type Input = CreateIntroInput;
    type Output = IntroRequest;

    async fn call(&self, ctx: &Context, input: CreateIntroInput) -> Result<IntroRequest> {
        intros::request_intro(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct Mine;

#[async_trait]
impl Procedure for Mine {
    const NAME: &'static str = "intro.mine";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Roles(&[Role::Founder]);

    type Input = Page;
    type Output = Vec<IntroView>;

    async fn call(&self, ctx: &Context, input: Page) -> Result<Vec<IntroView>> {
        intros::list_my_intros(ctx.storage(), ctx.caller()?, input).await
    }
}

pub struct ForTalent;

#[async_trait]
impl Procedure for ForTalent {
    const NAME: &'static str = "intro.forTalent";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Roles(&[Role::Talent]);

    type Input = Page;
    type Output = Vec<IntroView>;

    async fn call(&self, ctx: &Context, input: Page) -> Result<Vec<IntroView>> {
        intros::list_intros_for_talent(ctx.storage(), ctx.caller()?, input).await
    }
}

pub struct List;

#[async_trait]
impl Procedure for List {
    const NAME: &'static str = "intro.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = ADMIN;

    type Input = IntroFilter;
    type Output = Vec<IntroView>;

    async fn call(&self, ctx: &Context, input: IntroFilter) -> Result<Vec<IntroView>> {
        intros::list_intros(ctx.storage(), ctx.caller()?, &input).await
    }
}

pub struct Review;

#[async_trait]
impl Procedure for Review {
    const NAME: &'static str = "intro.review";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = ReviewIntroInput;
    type Output = IntroRequest;

    async fn call(&self, ctx: &Context, input: ReviewIntroInput) -> Result<IntroRequest> {
        intros::review_intro(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct Cancel;

#[async_trait]
impl Procedure for Cancel {
    const NAME: &'static str = "intro.cancel";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Roles(&[Role::Founder]);

    type Input = IdInput;
    type Output = Ack;

    async fn call(&self, ctx: &Context, input: IdInput) -> Result<Ack> {
        intros::cancel_intro(ctx.storage(), ctx.caller()?, input.id).await?;
        Ok(Ack::OK)
    }
}
