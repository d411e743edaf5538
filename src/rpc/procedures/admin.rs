//! `admin.*` procedures

use async_trait::async_trait;

use crate::domain::Role;
use crate::error::Result;
use crate::rpc::{Access, Context, Procedure, ProcedureKind};
use crate::services::admin::{self, AccountSummary, DashboardStats, ListAccountsInput};

pub struct Stats;

#[async_trait]
impl Procedure for Stats {
    const NAME: &'static str = "admin.stats";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Roles(&[Role::Admin]);

    type Input = ();
    type Output = DashboardStats;

    async fn call(&self, ctx: &Context, _input: ()) -> Result<DashboardStats> {
        admin::dashboard_stats(ctx.storage(), ctx.now).await
    }
}

pub struct Accounts;

#[async_trait]
impl Procedure for Accounts {
    const NAME: &'static str = "account.list";
    const KIND: ProcedureKind = ProcedureKind::Query;
    const ACCESS: Access = Access::Roles(&[Role::Admin]);

    type Input = ListAccountsInput;
    type Output = Vec<AccountSummary>;

    async fn call(&self, ctx: &Context, input: ListAccountsInput) -> Result<Vec<AccountSummary>> {
        admin::list_accounts(ctx.storage(), ctx.caller()?, &input).await
    }
}
