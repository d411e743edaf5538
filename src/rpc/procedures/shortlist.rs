//! `shortlist.*` procedures

use async_trait::async_trait;

use super::Ack;
use crate::domain::{Role, ShortlistEntry};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::shortlist::{self, ShortlistInput, ShortlistView, TalentIdInput};

const FOUNDER: Access = Access::Roles(&[Role::Founder]);

pub struct Add;

#[async_trait]
impl Procedure for Add {
    const NAME: &'static str = "shortlist.add";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = FOUNDER;

    type Input = ShortlistInput;
    type Output = ShortlistEntry;

    async fn call(&self, ctx: &Context, input: ShortlistInput) -> Result<ShortlistEntry> {
        shortlist::add_to_shortlist(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}

pub struct Remove;

#[async_trait]
impl Procedure for Remove {
    const NAME: &'static str = "shortlist.remove";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = FOUNDER;

    type Input = TalentIdInput;
    type Output = Ack;

    async fn call(&self, ctx: &Context, input: TalentIdInput) -> Result<Ack> {
        shortlist::remove_from_shortlist(ctx.storage(), ctx.caller()?, input.talent_id).await?;
        Ok(Ack::OK)
    }
}

pub struct Mine;

#[async_trait]
impl Procedure for Mine {
    const NAME: &'static str = "shortlist.mine";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = FOUNDER;

    type Input = ();
    type Output = Vec<ShortlistView>;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Vec<ShortlistView>> {
        shortlist::my_shortlist(ctx.storage(), ctx.caller()?).await
    }
}

pub struct UpdateNote;

#[async_trait]
impl Procedure for UpdateNote {
    const NAME: &'static str = "shortlist.updateNote";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = FOUNDER;

    type Input = ShortlistInput;
    type Output = ShortlistEntry;

    async fn call(&self, ctx: &Context, input: ShortlistInput) -> Result<ShortlistEntry> {
        shortlist::update_note(ctx.storage(), ctx.caller()?, &input, ctx.now).await
    }
}
