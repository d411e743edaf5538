//! Server-rendered pages
//!
//! Every handler takes a [`View`], which carries the template engine and the
//! caller resolved by the guard. Handlers return [`PageResult`]; failures
//! render `error.html` with the matching status, and form handlers re-render
//! their own template with the field issues instead.

pub mod admin;
pub mod auth;
pub mod founder;
pub mod invite;
pub mod talent;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tera::Tera;
use tracing::error;
use url::form_urlencoded;

use super::guard::see_other;
use super::session::CurrentSession;
use super::AppState;
use crate::domain::Caller;
use crate::error::{describe_error_code, MarketError, RpcErrorCode};
use crate::storage::Page;

pub type PageResult = std::result::Result<Response, PageError>;

/// Rendering handle for one request
#[derive(Clone)]
pub struct View {
    templates: Arc<Tera>,
    session: CurrentSession,
}

impl FromRequestParts<AppState> for View {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default();
        Ok(View {
            templates: state.templates.clone(),
            session,
        })
    }
}

impl View {
    pub fn session(&self) -> &CurrentSession {
        &self.session
    }

    /// The signed-in caller; the guard only lets signed-in callers reach
    /// area pages, so a miss here means the session vanished mid-request
    pub fn caller(&self) -> Result<&Caller, PageError> {
        self.session
            .caller
            .as_ref()
            .ok_or_else(|| self.fail(MarketError::unauthenticated()))
    }

    pub fn fail(&self, error: MarketError) -> PageError {
        PageError {
            view: self.clone(),
            error,
        }
    }

    fn context(&self, ctx: tera::Context) -> tera::Context {
        let mut base = tera::Context::new();
        base.insert("caller", &self.session.caller);
        base.insert("errors", &BTreeMap::<String, String>::new());
        base.extend(ctx);
        base
    }

    fn render_status(&self, status: StatusCode, name: &str, ctx: tera::Context) -> PageResult {
        match self.templates.render(name, &self.context(ctx)) {
            Ok(html) => Ok((status, Html(html)).into_response()),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub fn render(&self, name: &str, ctx: tera::Context) -> PageResult {
        self.render_status(StatusCode::OK, name, ctx)
    }

    /// Re-render a form after `error`, keeping what the user typed.
    /// Server errors still go to the error page.
    pub fn form_error(
        &self,
        name: &str,
        mut ctx: tera::Context,
        values: &impl Serialize,
        error: MarketError,
    ) -> PageResult {
        let status = error.rpc_code().http_status();
        if status.is_server_error() {
            return Err(self.fail(error));
        }

        let errors: BTreeMap<&str, &str> = error
            .issues()
            .iter()
            .rev()
            .map(|issue| (issue.field.as_str(), issue.message.as_str()))
            .collect();
        if errors.is_empty() {
            ctx.insert("error", &error.user_message());
        } else {
            ctx.insert("error", "Please correct the highlighted fields.");
        }
        ctx.insert("errors", &errors);
        ctx.insert("values", values);
        self.render_status(status, name, ctx)
    }
}

/// A page that could not be produced
pub struct PageError {
    view: View,
    error: MarketError,
}

impl PageError {
    pub fn error(&self) -> &MarketError {
        &self.error
    }
}

impl std::fmt::Debug for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageError").field("error", &self.error).finish()
    }
}

fn heading(code: RpcErrorCode) -> &'static str {
    match code {
        RpcErrorCode::BadRequest => "Invalid request",
        RpcErrorCode::Unauthorized => "Sign in required",
        RpcErrorCode::Forbidden => "Not allowed",
        RpcErrorCode::NotFound => "Not found",
        RpcErrorCode::MethodNotSupported => "Not supported",
        RpcErrorCode::Conflict => "Conflict",
        RpcErrorCode::PreconditionFailed => "No longer possible",
        RpcErrorCode::InternalServerError => "Something went wrong",
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let code = self.error.rpc_code();
        if code == RpcErrorCode::Unauthorized {
            return see_other("/login");
        }

        let status = code.http_status();
        let message = if status.is_server_error() {
            error!(
                error = %self.error,
                kind = describe_error_code(self.error.code()),
                "Page failed"
            );
            "The server hit an unexpected problem. Please try again.".to_string()
        } else {
            self.error.user_message()
        };

        let mut ctx = tera::Context::new();
        ctx.insert("heading", heading(code));
        ctx.insert("message", &message);
        match self.view.templates.render("error.html", &self.view.context(ctx)) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!(error = %e, "Error page failed to render");
                (status, message).into_response()
            }
        }
    }
}

/// Confirmation shown after a post/redirect/get round trip, keyed by the
/// `done` query parameter
pub(crate) fn notice(done: Option<&str>) -> Option<&'static str> {
    match done? {
        "saved" => Some("Changes saved."),
        "revoked" => Some("Invite revoked."),
        "reviewed" => Some("Decision recorded."),
        "requested" => Some("Intro request sent. An administrator will review it."),
        "cancelled" => Some("Intro request cancelled."),
        "shortlisted" => Some("Added to your shortlist."),
        "removed" => Some("Removed."),
        "added" => Some("Added."),
        "deleted" => Some("Deleted."),
        "rated" => Some("Rating saved."),
        "tagged" => Some("Tags updated."),
        _ => None,
    }
}

/// Rows per page on admin lists
pub(crate) const LIST_PAGE_SIZE: usize = 50;

/// Newer/older links for an offset-paged list
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Pager {
    pub newer: Option<String>,
    pub older: Option<String>,
}

impl Pager {
    /// One row past the page, so the next page is known to exist
    pub fn fetch(offset: usize) -> Page {
        Page::new(LIST_PAGE_SIZE + 1, offset)
    }

    /// Trim `items` fetched with [`Pager::fetch`] to the page and link its
    /// neighbours. Blank `params` are left out of the links.
    pub fn split<T>(path: &str, params: &[(&str, &str)], offset: usize, items: &mut Vec<T>) -> Self {
        let has_older = items.len() > LIST_PAGE_SIZE;
        items.truncate(LIST_PAGE_SIZE);

        let link = |offset: usize| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (name, value) in params.iter().filter(|(_, v)| !v.trim().is_empty()) {
                query.append_pair(name, value);
            }
            if offset > 0 {
                query.append_pair("offset", &offset.to_string());
            }
            let query = query.finish();
            if query.is_empty() {
                path.to_string()
            } else {
                format!("{}?{}", path, query)
            }
        };
        Self {
            newer: (offset > 0).then(|| link(offset.saturating_sub(LIST_PAGE_SIZE))),
            older: has_older.then(|| link(offset.saturating_add(LIST_PAGE_SIZE))),
        }
    }
}

/// Parse an optional query value, treating blank and unknown values as absent
pub(crate) fn parse_opt<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}
