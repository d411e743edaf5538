//! `tag.*` procedures

use async_trait::async_trait;

use super::Ack;
use crate::domain::{Role, Tag};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::tags::{self, CreateTagInput, TalentTagInput};

const ADMIN: Access = Access::Roles(&[Role::Admin]);

pub struct Create;

#[async_trait]
impl Procedure for Create {
    const NAME: &'static str = "tag.create";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = CreateTagInput;
    type Output = Tag;

    async fn call(&self, ctx: &Context, input: CreateTagInput) -> Result<Tag> {
        tags::create_tag(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct List;

#[async_trait]
impl Procedure for List {
    const NAME: &'static str = "tag.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = ADMIN;

    type Input = ();
    type Output = Vec<Tag>;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Vec<Tag>> {
        tags::list_tags(ctx.storage(), ctx.caller()?).await
    }
}

pub struct Attach;

#[async_trait]
impl Procedure for Attach {
    const NAME: &'static str = "tag.attach";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = TalentTagInput;
    type Output = Ack;

    async fn call(&self, ctx: &Context, input: TalentTagInput) -> Result<Ack> {
        tags::tag_talent(ctx.storage(), ctx.caller()?, &input).await?;
        Ok(Ack::OK)
    }
}

pub struct Detach;

#[async_trait]
impl Procedure for Detach {
    const NAME: &'static str = "tag.detach";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = TalentTagInput;
    type Output = Ack;

    async fn call(&self, ctx: &Context, input: TalentTagInput) -> Result<Ack> {
        tags::untag_talent(ctx.storage(), ctx.caller()?, &input).await?;
        Ok(Ack::OK)
    }
}
