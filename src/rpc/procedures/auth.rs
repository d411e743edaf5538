//! `auth.*` procedures

use async_trait::async_trait;

use super::Ack;
use crate::domain::Caller;
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind, SessionChange};
use crate::services::auth::{self, SignInInput, SignedIn};

pub struct SignIn;

#[async_trait]
impl Procedure for SignIn {
    const NAME: &'static str = "auth.signIn";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Public;

    type Input = SignInInput;
    type Output = SignedIn;

    async fn call(&self, ctx: &Context, input: SignInInput) -> Result<SignedIn> {
        let signed_in = auth::sign_in(ctx.storage(), &ctx.config.auth, &input, ctx.now).await?;
        ctx.set_session(SessionChange::Started {
            token: signed_in.token.clone(),
            expires_at: signed_in.expires_at,
        });
        Ok(signed_in)
    }
}

pub struct SignOut;

#[async_trait]
impl Procedure for SignOut {
    const NAME: &'static str = "auth.signOut";
    const KIND: ProcedureKind = ProcedureKind::Mutation;
    const ACCESS: Access = Access::Public;

    type Input = ();
    type Output = Ack;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Ack> {
        if let Some(token) = &ctx.session_token {
            auth::sign_out(ctx.storage(), token).await?;
        }
        ctx.set_session(SessionChange::Ended);
        Ok(Ack::OK)
    }
}

/// The current caller, or `null` when signed out
pub struct Me;

#[async_trait]
impl Procedure for Me {
    const NAME: &'static str = "auth.me";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Public;

    type Input = ();
    type Output = Option<Caller>;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<Option<Caller>> {
        Ok(ctx.caller.clone())
    }
}
