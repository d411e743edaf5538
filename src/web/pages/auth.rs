use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Form;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PageResult, View};
use crate::services::auth::{self, SignInInput};
use crate::validation::Validate;
use crate::web::guard::see_other;
use crate::web::session::{clear_cookie, session_cookie};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginForm {
    email: String,
    #[serde(skip_serializing)]
    password: String,
    #[serde(default)]
    next: String,
}

/// Only same-site absolute paths are followed after sign-in
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\");
    (local && !next.starts_with("/login")).then_some(next)
}

fn login_context(next: &str) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("next", next);
    ctx
}

pub async fn login_page(view: View, Query(query): Query<LoginQuery>) -> PageResult {
    let next = query.next.as_deref().and_then(safe_next).unwrap_or("");
    view.render("login.html", login_context(next))
}

pub async fn login(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let input = SignInInput {
        email: form.email.clone(),
        password: form.password.clone(),
    };
    let next = safe_next(&form.next).unwrap_or("").to_string();

    let now = Utc::now();
    let outcome = match input.validate() {
        Ok(()) => auth::sign_in(state.storage.as_ref(), &state.config.auth, &input, now).await,
        Err(errors) => Err(errors.into()),
    };
    let signed_in = match outcome {
        Ok(signed_in) => signed_in,
        Err(e) => return view.form_error("login.html", login_context(&next), &form, e),
    };

    let location = if next.is_empty() {
        signed_in.caller.role.home_path().to_string()
    } else {
        next
    };
    debug!(account_id = %signed_in.caller.account_id, location = %location, "Signed in");

    let mut response = see_other(&location);
    if let Some(cookie) =
        session_cookie(&state.config.auth, &signed_in.token, signed_in.expires_at, now)
    {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn logout(State(state): State<AppState>, view: View) -> Response {
    if let Some(token) = &view.session().token {
        if let Err(e) = auth::sign_out(state.storage.as_ref(), token).await {
            return view.fail(e).into_response();
        }
    }
    let mut response = see_other("/login");
    if let Some(cookie) = clear_cookie(&state.config.auth) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}
