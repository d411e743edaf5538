//! HTTP binding for the procedure registry
//!
//! Queries: `GET /api/rpc/{name}?input=<json>`.
//! Mutations: `POST /api/rpc/{name}` with a JSON body.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::Value;

use super::session::{clear_cookie, session_cookie, CurrentSession};
use super::AppState;
use crate::error::{MarketError, Result};
use crate::rpc::{Context, ProcedureKind, SessionChange, SuccessEnvelope};

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    input: Option<String>,
}

fn parse_json(raw: &[u8]) -> Result<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw)
        .map_err(|e| MarketError::malformed(format!("input is not valid JSON: {}", e)))
}

pub async fn query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<QueryParams>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    let input = match parse_json(params.input.as_deref().unwrap_or("").as_bytes()) {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };
    call(state, name, ProcedureKind::Query, session, input).await
}

pub async fn mutation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(session): Extension<CurrentSession>,
    body: Bytes,
) -> Response {
    let input = match parse_json(&body) {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };
    call(state, name, ProcedureKind::Mutation, session, input).await
}

async fn call(
    state: AppState,
    name: String,
    kind: ProcedureKind,
    session: CurrentSession,
    input: Value,
) -> Response {
    let ctx = Context::new(
        state.storage.clone(),
        state.config.clone(),
        session.caller,
        session.token,
    );

    match state.registry.dispatch(&name, kind, &ctx, input).await {
        Ok(data) => {
            let mut response = SuccessEnvelope::new(data).into_response();
            let cookie = match ctx.take_session_change() {
                Some(SessionChange::Started { token, expires_at }) => {
                    session_cookie(&state.config.auth, &token, expires_at, ctx.now)
                }
                Some(SessionChange::Ended) => clear_cookie(&state.config.auth),
                None => None,
            };
            if let Some(cookie) = cookie {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        assert_eq!(parse_json(b"").unwrap(), Value::Null);
        assert_eq!(parse_json(b"  \n").unwrap(), Value::Null);
        assert_eq!(parse_json(br#"{"a":1}"#).unwrap()["a"], 1);
        let err = parse_json(b"{nope").unwrap_err();
        assert_eq!(err.rpc_code(), crate::error::RpcErrorCode::BadRequest);
    }
}
