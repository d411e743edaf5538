//! Typed remote procedures
//!
//! A [`Procedure`] declares its name, whether it is a query or a mutation,
//! who may call it and its input/output types. The [`ProcedureRegistry`]
//! erases those types so the HTTP layer can dispatch by name. Every call is
//! decoded, validated and access-checked before the procedure body runs.

pub mod envelope;
pub mod procedures;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::domain::{Caller, Role};
use crate::error::{ErrorCode, MarketError, Result};
use crate::storage::MarketplaceStorage;
use crate::validation::Validate;

pub use envelope::{ErrorBody, ErrorEnvelope, ResultData, SuccessEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    /// Read-only, called with `GET`
    Query,
    /// Changes state, called with `POST`
    Mutation,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Mutation => f.write_str("mutation"),
        }
    }
}

/// Who may call a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

impl Access {
    pub fn check(&self, caller: Option<&Caller>) -> Result<()> {
        match (self, caller) {
            (Access::Public, _) => Ok(()),
            (_, None) => Err(MarketError::unauthenticated()),
            (Access::Authenticated, Some(_)) => Ok(()),
            (Access::Roles(roles), Some(caller)) if roles.contains(&caller.role) => Ok(()),
            (Access::Roles(_), Some(_)) => {
                Err(MarketError::forbidden("you do not have access to this procedure"))
            }
        }
    }
}

/// Change to the caller's session requested by a procedure. The HTTP layer
/// turns it into a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Started {
        token: String,
        expires_at: DateTime<Utc>,
    },
    Ended,
}

/// Per-call context handed to every procedure
pub struct Context {
    pub storage: Arc<dyn MarketplaceStorage>,
    pub config: Arc<AppConfig>,
    pub caller: Option<Caller>,
    /// Clear session token presented with the request, if any
    pub session_token: Option<String>,
    pub now: DateTime<Utc>,
    session_change: Mutex<Option<SessionChange>>,
}

impl Context {
    pub fn new(
        storage: Arc<dyn MarketplaceStorage>,
        config: Arc<AppConfig>,
        caller: Option<Caller>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            storage,
            config,
            caller,
            session_token,
            now: Utc::now(),
            session_change: Mutex::new(None),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn storage(&self) -> &dyn MarketplaceStorage {
        self.storage.as_ref()
    }

    /// The authenticated caller; access checks guarantee one for every
    /// non-public procedure
    pub fn caller(&self) -> Result<&Caller> {
        self.caller.as_ref().ok_or_else(MarketError::unauthenticated)
    }

    pub fn set_session(&self, change: SessionChange) {
        if let Ok(mut slot) = self.session_change.lock() {
            *slot = Some(change);
        }
    }

    pub fn take_session_change(&self) -> Option<SessionChange> {
        self.session_change.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// A typed remote procedure
#[async_trait]
pub trait Procedure: Send + Sync + 'static {
    const NAME: &'static str;
    const KIND: ProcedureKind;
    const ACCESS: Access;

    type Input: DeserializeOwned + Validate + Send + Sync;
    type Output: Serialize + Send;

    async fn call(&self, ctx: &Context, input: Self::Input) -> Result<Self::Output>;
}

#[async_trait]
trait ErasedProcedure: Send + Sync {
    fn kind(&self) -> ProcedureKind;

    fn access(&self) -> Access;

    async fn invoke(&self, ctx: &Context, input: Value) -> Result<Value>;
}

struct Erased<P>(P);

impl<P: Procedure> Erased<P> {
    /// Absent input and `{}` are interchangeable, so structs made only of
    /// optional fields and `()` inputs both accept an empty call
    fn decode(input: Value) -> Result<P::Input> {
        let empty = match &input {
            Value::Null => Some(Value::Object(Default::default())),
            Value::Object(map) if map.is_empty() => Some(Value::Null),
            _ => None,
        };
        match serde_json::from_value::<P::Input>(input) {
            Ok(decoded) => Ok(decoded),
            Err(first) if empty.is_some() => {
                serde_json::from_value(empty.unwrap_or_default()).map_err(|_| {
                    MarketError::malformed(format!("input for {} is missing: {}", P::NAME, first))
                })
            }
            Err(e) => Err(MarketError::malformed(format!(
                "input for {} does not match its schema: {}",
                P::NAME,
                e
            ))),
        }
    }
}

#[async_trait]
impl<P: Procedure> ErasedProcedure for Erased<P> {
    fn kind(&self) -> ProcedureKind {
        P::KIND
    }

    fn access(&self) -> Access {
        P::ACCESS
    }

    async fn invoke(&self, ctx: &Context, input: Value) -> Result<Value> {
        let input = Self::decode(input)?;
        input.validate()?;
        let output = self.0.call(ctx, input).await?;
        serde_json::to_value(output).map_err(|e| {
            MarketError::internal(format!("cannot serialize output of {}", P::NAME)).with_source(e)
        })
    }
}

/// Name-indexed set of procedures, built once at startup
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<&'static str, Arc<dyn ErasedProcedure>>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every marketplace procedure
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        procedures::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register a procedure; a second procedure with the same name is an error
    pub fn register<P: Procedure>(&mut self, procedure: P) -> Result<()> {
        if self.procedures.contains_key(P::NAME) {
            return Err(MarketError::rpc(
                ErrorCode::RPC_GENERIC,
                format!("procedure {} is already registered", P::NAME),
            ));
        }
        self.procedures.insert(P::NAME, Arc::new(Erased(procedure)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ProcedureKind> {
        self.procedures.get(name).map(|p| p.kind())
    }

    /// Sorted procedure names
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.procedures.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Look up, method-check, access-check and run a procedure
    pub async fn dispatch(
        &self,
        name: &str,
        kind: ProcedureKind,
        ctx: &Context,
        input: Value,
    ) -> Result<Value> {
        let started = Instant::now();
        let role = ctx
            .caller
            .as_ref()
            .map(|c| c.role.as_str())
            .unwrap_or("anonymous");

        let outcome = self.run(name, kind, ctx, input).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => info!(procedure = name, role, elapsed_ms, "rpc ok"),
            Err(e) if e.rpc_code().http_status().is_server_error() => {
                warn!(procedure = name, role, elapsed_ms, error = %e, "rpc failed")
            }
            Err(e) => debug!(
                procedure = name,
                role,
                elapsed_ms,
                code = ?e.rpc_code(),
                "rpc rejected"
            ),
        }
        outcome
    }

    async fn run(
        &self,
        name: &str,
        kind: ProcedureKind,
        ctx: &Context,
        input: Value,
    ) -> Result<Value> {
        let procedure = self.procedures.get(name).ok_or_else(|| {
            MarketError::rpc(
                ErrorCode::RPC_UNKNOWN_PROCEDURE,
                format!("no procedure named {}", name),
            )
        })?;

        if procedure.kind() != kind {
            return Err(MarketError::rpc(
                ErrorCode::RPC_METHOD_NOT_SUPPORTED,
                format!("{} is a {} and cannot be called as a {}", name, procedure.kind(), kind),
            ));
        }

        procedure.access().check(ctx.caller.as_ref())?;
        procedure.invoke(ctx, input).await
    }
}
