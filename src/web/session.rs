//! Session token transport: cookie or bearer header

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

use crate::config::AuthConfig;
use crate::domain::Caller;

/// Resolved identity attached to every request by the guard middleware
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub caller: Option<Caller>,
    /// Clear token as presented by the client
    pub token: Option<String>,
}

impl CurrentSession {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Token from `Authorization: Bearer` or, failing that, the session cookie
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Value of the named cookie across every `Cookie` header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a new session token
pub fn session_cookie(
    auth: &AuthConfig,
    token: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<HeaderValue> {
    let max_age = (expires_at - now).num_seconds().max(0);
    build_cookie(auth, token, max_age)
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(auth: &AuthConfig) -> Option<HeaderValue> {
    build_cookie(auth, "", 0)
}

fn build_cookie(auth: &AuthConfig, value: &str, max_age: i64) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        auth.cookie_name, value, max_age
    );
    if auth.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
