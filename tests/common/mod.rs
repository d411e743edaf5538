//! Common test utilities: an in-memory app driven through `oneshot`
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use talentdeck::config::AppConfig;
use talentdeck::services::auth;
use talentdeck::storage::StorageFactory;
use talentdeck::web::{build_router, AppState};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const PASSWORD: &str = "correct horse battery";

/// Decoded response from one request
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn data(&self) -> Value {
        self.json()["result"]["data"].clone()
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap_or_default().to_string()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Session token carried by `Set-Cookie`, if the response set one
    pub fn session_token(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "td_session")
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Memory-backed app with one administrator account
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let storage = StorageFactory::memory();
        auth::create_admin(
            storage.as_ref(),
            ADMIN_EMAIL,
            ADMIN_PASSWORD,
            "Ops",
            Utc::now(),
        )
        .await
        .expect("admin bootstrap");
        let state = AppState::new(storage, config).expect("app state");
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response: Response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        Reply {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.send(request(Method::GET, uri, token, Body::empty(), None))
            .await
    }

    pub async fn post_form(&self, uri: &str, token: Option<&str>, form: &[(&str, &str)]) -> Reply {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        self.send(request(
            Method::POST,
            uri,
            token,
            Body::from(body),
            Some("application/x-www-form-urlencoded"),
        ))
        .await
    }

    pub async fn query(&self, name: &str, input: Option<Value>, token: Option<&str>) -> Reply {
        let uri = match input {
            Some(input) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(input.to_string().as_bytes()).collect();
                format!("/api/rpc/{}?input={}", name, encoded)
            }
            None => format!("/api/rpc/{}", name),
        };
        self.get(&uri, token).await
    }

    pub async fn mutation(&self, name: &str, input: Value, token: Option<&str>) -> Reply {
        self.send(request(
            Method::POST,
            &format!("/api/rpc/{}", name),
            token,
            Body::from(input.to_string()),
            Some("application/json"),
        ))
        .await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> String {
        let reply = self
            .mutation(
                "auth.signIn",
                json!({"email": email, "password": password}),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "sign in failed: {}", reply.body);
        reply.session_token().expect("session cookie")
    }

    pub async fn admin_token(&self) -> String {
        self.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Issue an invite as admin and return its clear token
    pub async fn invite(&self, admin: &str, email: &str, role: &str) -> String {
        let reply = self
            .mutation(
                "invite.create",
                json!({"email": email, "role": role}),
                Some(admin),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "invite failed: {}", reply.body);
        reply.data()["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// Invite, accept and return the new account's session token
    pub async fn onboard(&self, admin: &str, email: &str, role: &str, name: &str) -> String {
        let token = self.invite(admin, email, role).await;
        let reply = self
            .mutation(
                "invite.accept",
                json!({"token": token, "display_name": name, "password": PASSWORD}),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "accept failed: {}", reply.body);
        reply.session_token().expect("session cookie")
    }

    /// Onboard a talent, fill in the profile and publish it. Returns the
    /// talent's account id and session token.
    pub async fn published_talent(&self, admin: &str, email: &str, name: &str) -> (String, String) {
        let token = self.onboard(admin, email, "talent", name).await;
        let reply = self
            .mutation(
                "talent.update",
                json!({
                    "full_name": name,
                    "headline": "Systems engineer",
                    "skills": ["Rust", "PostgreSQL"],
                    "years_experience": 8,
                }),
                Some(&token),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "update failed: {}", reply.body);
        let id = reply.data()["account_id"].as_str().expect("id").to_string();

        let reply = self
            .mutation(
                "talent.curate",
                json!({"id": id, "status": "published"}),
                Some(admin),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "curate failed: {}", reply.body);
        (id, token)
    }
}

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("td_session={}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("request")
}
