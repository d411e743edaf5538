//! `experience.*` procedures, a talent's own past roles

use async_trait::async_trait;

use super::{Ack, IdInput};
use crate::domain::{PastRole, Role, RoleDetails};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::experience::{self, UpdatePastRoleInput};

const TALENT: Access = Access::Roles(&[Role::Talent]);

pub struct List;

#[async_trait]
impl Procedure for List {
    const NAME: &'static str = "experience.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = TALENT;

    type Input = ();
    type Output = Vec<PastRole>;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Vec<PastRole>> {
        experience::list_own_roles(ctx.storage(), ctx.caller()?).await
    }
}

pub struct Add;

#[async_trait]
impl Procedure for Add {
    const NAME: &'static str = "experience.add";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = TALENT;

    type Input = RoleDetails;
    type Output = PastRole;

    async fn call(&self, ctx: &Context, input: RoleDetails) -> Result<PastRole> {
        experience::add_role(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct Update;

#[async_trait]
impl Procedure for Update {
    const NAME: &'static str = "experience.update";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = TALENT;

    type Input = UpdatePastRoleInput;
    type Output = PastRole;

    async fn call(&self, ctx: &Context, input: UpdatePastRoleInput) -> Result<PastRole> {
        experience::update_role(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct Delete;

#[async_trait]
impl Procedure for Delete {
    const NAME: &'static str = "experience.delete";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = TALENT;

    type Input = IdInput;
    type Output = Ack;

    async fn call(&self, ctx: &Context, input: IdInput) -> Result<Ack> {
        experience::delete_role(ctx.storage(), ctx.caller()?, input.id).await?;
        Ok(Ack::OK)
    }
}
