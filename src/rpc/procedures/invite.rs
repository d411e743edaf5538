//! `invite.*` procedures

use async_trait::async_trait;

use super::{IdInput, TokenInput};
use crate::domain::{Invite, Role};
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind, SessionChange};
use crate::services::auth::SignedIn;
use crate::services::invites::{
    self, AcceptInviteInput, CreateInviteInput, InviteSummary, IssuedInvite,
};
use crate::storage::InviteFilter;

const ADMIN: Access = Access::Roles(&[Role::Admin]);

pub struct Create;

#[async_trait]
impl Procedure for Create {
    const NAME: &'static str = "invite.create";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = CreateInviteInput;
    type Output = IssuedInvite;

    async fn call(&self, ctx: &Context, input: CreateInviteInput) -> Result<IssuedInvite> {
        let admin = ctx.caller()?;
        invites::create_invite(ctx.storage(), &ctx.config, Some(admin), &input, ctx.now).await
    }
}

pub struct List;

#[async_trait]
impl Procedure for List {
    const NAME: &'static str = "invite.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = ADMIN;

    type Input = InviteFilter;
    type Output = Vec<Invite>;

    async fn call(&self, ctx: &Context, input: InviteFilter) -> Result<Vec<Invite>> {
        invites::list_invites(ctx.storage(), &input, ctx.now).await
    }
}

pub struct Revoke;

#[async_trait]
impl Procedure for Revoke {
    const NAME: &'static str = "invite.revoke";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = ADMIN;

    type Input = IdInput;
    type Output = Invite;

    async fn call(&self, ctx: &Context, input: IdInput) -> Result<Invite> {
        invites::revoke_invite(ctx.storage(), input.id, ctx.now).await
    }
}

pub struct Verify;

#[async_trait]
impl Procedure for Verify {
    const NAME: &'static str = "invite.verify";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Public;

    type Input = TokenInput;
    type Output = InviteSummary;

    async fn call(&self, ctx: &Context, input: TokenInput) -> Result<InviteSummary> {
        invites::verify_invite(ctx.storage(), &input.token, ctx.now).await
    }
}

pub struct Accept;

#[async_trait]
impl Procedure for Accept {
    const NAME: &'static str = "invite.accept";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Public;

    type Input = AcceptInviteInput;
    type Output = SignedIn;

    async fn call(&self, ctx: &Context, input: AcceptInviteInput) -> Result<SignedIn> {
        let signed_in = invites::accept_invite(ctx.storage(), &ctx.config, &input, ctx.now).await?;
        ctx.set_session(SessionChange::Started {
            token: signed_in.token.clone(),
            expires_at: signed_in.expires_at,
        });
        Ok(signed_in)
    }
}
