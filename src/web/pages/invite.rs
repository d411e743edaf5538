use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Form;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PageResult, View};
use crate::error::{MarketError, Result};
use crate::services::invites::{self, AcceptInviteInput, InviteSummary};
use crate::validation::Validate;
use crate::web::guard::see_other;
use crate::web::session::session_cookie;
use crate::web::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AcceptForm {
    display_name: String,
    #[serde(skip_serializing)]
    password: String,
}

/// The invite, or `None` when the token matches nothing
async fn lookup(state: &AppState, token: &str, now: DateTime<Utc>) -> Result<Option<InviteSummary>> {
    match invites::verify_invite(state.storage.as_ref(), token, now).await {
        Ok(summary) => Ok(Some(summary)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn invite_context(token: &str, invite: &Option<InviteSummary>) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("token", token);
    ctx.insert("invite", invite);
    ctx
}

pub async fn invite_page(
    State(state): State<AppState>,
    view: View,
    Path(token): Path<String>,
) -> PageResult {
    let invite = lookup(&state, &token, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    let response = view.render("invite.html", invite_context(&token, &invite))?;
    Ok(match invite {
        Some(_) => response,
        None => (StatusCode::NOT_FOUND, response).into_response(),
    })
}

pub async fn accept(
    State(state): State<AppState>,
    view: View,
    Path(token): Path<String>,
    Form(form): Form<AcceptForm>,
) -> PageResult {
    let now = Utc::now();
    let input = AcceptInviteInput {
        token: token.clone(),
        display_name: form.display_name.clone(),
        password: form.password.clone(),
    };

    let outcome: Result<_> = match input.validate() {
        Ok(()) => invites::accept_invite(state.storage.as_ref(), &state.config, &input, now).await,
        Err(errors) => Err(MarketError::from(errors)),
    };
    let signed_in = match outcome {
        Ok(signed_in) => signed_in,
        Err(e) => {
            let invite = lookup(&state, &token, now).await.map_err(|e| view.fail(e))?;
            return view.form_error("invite.html", invite_context(&token, &invite), &form, e);
        }
    };

    let mut response = see_other(signed_in.caller.role.home_path());
    if let Some(cookie) =
        session_cookie(&state.config.auth, &signed_in.token, signed_in.expires_at, now)
    {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}
