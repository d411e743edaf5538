//! HTTP surface: router, shared state and server loop

pub mod guard;
pub mod pages;
pub mod rpc;
pub mod session;
pub mod templates;

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use std::sync::Arc;
use tera::Tera;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{MarketError, Result};
use crate::rpc::ProcedureRegistry;
use crate::storage::MarketplaceStorage;

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn MarketplaceStorage>,
    pub config: Arc<AppConfig>,
    pub registry: Arc<ProcedureRegistry>,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(storage: Arc<dyn MarketplaceStorage>, config: AppConfig) -> Result<Self> {
        Ok(Self {
            storage,
            config: Arc::new(config),
            registry: Arc::new(ProcedureRegistry::with_defaults()?),
            templates: Arc::new(templates::load()?),
        })
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    use pages::{admin, auth, founder, invite, talent};

    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/static/site.css", get(stylesheet))
        .route("/api/rpc/{name}", get(rpc::query).post(rpc::mutation))
        // Sign-in and invites
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/invite/{token}", get(invite::invite_page).post(invite::accept))
        // Admin
        .route("/admin", get(admin::dashboard))
        .route("/admin/invites", get(admin::invites_page).post(admin::create_invite))
        .route("/admin/invites/{id}/revoke", post(admin::revoke_invite))
        .route("/admin/talent", get(admin::talent_page))
        .route("/admin/talent/{id}", get(admin::talent_detail).post(admin::curate))
        .route("/admin/talent/{id}/rating", post(admin::rate))
        .route("/admin/talent/{id}/tags", post(admin::attach_tag))
        .route("/admin/talent/{id}/tags/{tag_id}/remove", post(admin::detach_tag))
        .route("/admin/tags", get(admin::tags_page).post(admin::create_tag))
        .route("/admin/intros", get(admin::intros_page))
        .route("/admin/intros/{id}", post(admin::review))
        // Founder
        .route("/founder", get(founder::browse))
        .route(
            "/founder/talent/{id}",
            get(founder::talent_page).post(founder::request_intro),
        )
        .route(
            "/founder/talent/{id}/shortlist",
            post(founder::shortlist_add),
        )
        .route("/founder/intros", get(founder::intros_page))
        .route("/founder/intros/{id}/cancel", post(founder::cancel_intro))
        .route("/founder/shortlist", get(founder::shortlist_page))
        .route("/founder/shortlist/{id}/note", post(founder::shortlist_note))
        .route("/founder/shortlist/{id}/remove", post(founder::shortlist_remove))
        .route(
            "/founder/profile",
            get(founder::profile_page).post(founder::update_profile),
        )
        // Talent
        .route("/talent", get(talent::profile_page).post(talent::update_profile))
        .route("/talent/intros", get(talent::intros_page))
        .route(
            "/talent/experience",
            get(talent::experience_page).post(talent::add_role),
        )
        .route("/talent/experience/{id}", post(talent::update_role))
        .route("/talent/experience/{id}/delete", post(talent::delete_role))
        .layer(middleware::from_fn_with_state(state.clone(), guard::guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// The guard redirects `/` before it gets here
async fn home() -> Response {
    guard::see_other("/login")
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/css; charset=utf-8")],
        templates::STYLESHEET,
    )
}

async fn healthz(State(state): State<AppState>) -> Response {
    match state.storage.health_check().await {
        Ok(health) => {
            let status = if health.healthy {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(health)).into_response()
        }
        Err(e) => MarketError::from(e).into_response(),
    }
}

/// Bind the configured address and serve until ctrl-c or SIGTERM
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        MarketError::internal(format!("failed to bind {}", addr)).with_source(e)
    })?;

    info!(
        listen = %addr,
        public_url = %state.config.server.base_url(),
        procedures = state.registry.len(),
        "talentdeck listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MarketError::internal("server error").with_source(e))?;

    info!("talentdeck shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
