//! Role-based route protection
//!
//! One middleware runs on every request. It resolves the session, attaches a
//! [`CurrentSession`] extension and applies [`decide`], a pure function of the
//! path and the caller's role.

use axum::extract::{Request, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::{debug, warn};

use super::session::{token_from_headers, CurrentSession};
use super::AppState;
use crate::domain::Role;
use crate::services::auth;

/// Outcome of the route guard for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    Allow,
    /// 303 to the given location
    Redirect(String),
}

const PUBLIC_PREFIXES: &[&str] = &["/invite/", "/api/rpc/", "/static/"];
const PUBLIC_PATHS: &[&str] = &["/login", "/logout", "/healthz"];

fn in_area(path: &str, area: &str) -> bool {
    path == area
        || path
            .strip_prefix(area)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Role owning an area of the site, if the path is inside one
fn area_role(path: &str) -> Option<Role> {
    Role::ALL
        .into_iter()
        .find(|role| in_area(path, role.home_path()))
}

fn login_redirect(path: &str) -> RouteAccess {
    RouteAccess::Redirect(format!("/login?next={}", url_encode(path)))
}

fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Decide what happens to a request for `path` from a caller with `role`
pub fn decide(path: &str, role: Option<Role>) -> RouteAccess {
    if path == "/login" {
        return match role {
            Some(role) => RouteAccess::Redirect(role.home_path().to_string()),
            None => RouteAccess::Allow,
        };
    }

    if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return RouteAccess::Allow;
    }

    if path == "/" {
        return RouteAccess::Redirect(match role {
            Some(role) => role.home_path().to_string(),
            None => "/login".to_string(),
        });
    }

    match (area_role(path), role) {
        (Some(_), None) => login_redirect(path),
        (Some(required), Some(role)) if required == role => RouteAccess::Allow,
        (Some(_), Some(role)) => RouteAccess::Redirect(role.home_path().to_string()),
        // Unknown paths fall through to the router's 404
        (None, _) => RouteAccess::Allow,
    }
}

pub fn see_other(location: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

/// Middleware applied to the whole router
pub async fn guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = token_from_headers(request.headers(), &state.config.auth.cookie_name);

    let caller = match &token {
        Some(token) => match auth::resolve_session(state.storage.as_ref(), token, Utc::now()).await
        {
            Ok(caller) => caller,
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                None
            }
        },
        None => None,
    };

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let role = caller.as_ref().map(|c| c.role);

    match decide(&path, role) {
        RouteAccess::Allow => {
            request
                .extensions_mut()
                .insert(CurrentSession { caller, token });
            next.run(request).await
        }
        RouteAccess::Redirect(location) => {
            debug!(path = %path, ?role, location = %location, "Route guard redirect");
            // Keep the original query string in the login return path
            let location = match query {
                Some(q) if location.starts_with("/login?next=") => {
                    format!("{}{}", location, url_encode(&format!("?{}", q)))
                }
                _ => location,
            };
            see_other(&location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn redirect(to: &str) -> RouteAccess {
        RouteAccess::Redirect(to.to_string())
    }

    #[test]
    fn test_public_paths() {
        for path in ["/login", "/healthz", "/invite/abc", "/api/rpc/auth.me", "/static/site.css"] {
            assert_eq!(decide(path, None), RouteAccess::Allow, "{path}");
        }
    }

    #[test]
    fn test_root_redirects_home() {
        assert_eq!(decide("/", None), redirect("/login"));
        assert_eq!(decide("/", Some(Role::Founder)), redirect("/founder"));
        assert_eq!(decide("/", Some(Role::Admin)), redirect("/admin"));
    }

    #[test]
    fn test_signed_out_goes_to_login_with_next() {
        assert_eq!(decide("/admin", None), redirect("/login?next=%2Fadmin"));
        assert_eq!(
            decide("/founder/talent/42", None),
            redirect("/login?next=%2Ffounder%2Ftalent%2F42")
        );
    }

    #[test]
    fn test_wrong_role_goes_home() {
        assert_eq!(decide("/admin/invites", Some(Role::Talent)), redirect("/talent"));
        assert_eq!(decide("/talent", Some(Role::Founder)), redirect("/founder"));
        assert_eq!(decide("/founder", Some(Role::Admin)), redirect("/admin"));
    }

    #[test]
    fn test_signed_in_login_goes_home() {
        assert_eq!(decide("/login", Some(Role::Talent)), redirect("/talent"));
    }

    #[test]
    fn test_area_prefix_is_segment_aware() {
        assert_eq!(area_role("/administrator"), None);
        assert_eq!(area_role("/admin/talent"), Some(Role::Admin));
        assert_eq!(decide("/talentless", None), RouteAccess::Allow);
    }

    proptest! {
        #[test]
        fn prop_areas_only_open_to_their_role(
            suffix in "(/[a-z0-9]{1,8}){0,3}",
            area in 0usize..3,
            caller in 0usize..3,
        ) {
            let owner = Role::ALL[area];
            let role = Role::ALL[caller];
            let path = format!("{}{}", owner.home_path(), suffix);
            let outcome = decide(&path, Some(role));
            if owner == role {
                prop_assert_eq!(outcome, RouteAccess::Allow);
            } else {
                prop_assert_eq!(outcome, RouteAccess::Redirect(role.home_path().to_string()));
            }
            let is_login = matches!(decide(&path, None), RouteAccess::Redirect(l) if l.starts_with("/login?next="));
            prop_assert!(is_login);
        }
    }
}
