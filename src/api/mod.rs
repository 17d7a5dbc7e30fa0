use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::admin::{Resource, UserResource};
use crate::config::Config;
use crate::services::UserService;
use crate::state::SharedState;
use crate::storage::PublicDisk;

mod admin;
mod error;
mod observability;
mod settings;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

/// Slack for multipart framing on top of the avatar size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn disk(&self) -> &PublicDisk {
        &self.shared.disk
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let public_url = config.storage.public_url.trim_end_matches('/').to_string();
    let avatar_limit =
        usize::try_from(config.storage.avatar_max_kb * 1024).unwrap_or(usize::MAX);

    let api_router = Router::new()
        .route("/admin/navigation", get(admin::navigation))
        .nest(
            &format!("/admin/{}", UserResource::SLUG),
            user_routes(
                state.user_service().editing_enabled(),
                avatar_limit.saturating_add(MULTIPART_OVERHEAD_BYTES),
            ),
        )
        .route("/settings", get(settings::list_settings))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route(
            "/metrics",
            get(observability::get_metrics).with_state(state.clone()),
        )
        .nest_service(&public_url, ServeDir::new(state.disk().root()))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_metrics))
}

/// Listing and bulk actions are always served; the create/edit pages and
/// their backing endpoints only when editing is enabled.
fn user_routes(editing_enabled: bool, upload_limit: usize) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/", get(users::list_users))
        .route("/schema", get(users::get_schema))
        .route("/bulk-delete", post(users::bulk_delete_users));

    if !UserResource::page_enabled("create", editing_enabled)
        && !UserResource::page_enabled("edit", editing_enabled)
    {
        info!("User editing disabled; serving listing routes only");
        return router;
    }

    router
        .route("/", post(users::create_user))
        .route("/role-options", get(users::role_options))
        .route(
            "/avatar",
            post(users::upload_avatar).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/avatar", delete(users::delete_avatar))
}
