use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::clients::{InternalServiceClient, NotificationClient, ProfileClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccessService, RegistrationService, SeaOrmAccessService, SeaOrmRegistrationService,
    SeaOrmSessionService, SessionService,
};

pub mod auth;
mod error;
pub mod observability;
pub mod system;
pub mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub sessions: Arc<dyn SessionService>,

    pub access: Arc<dyn AccessService>,

    pub registration: Arc<dyn RegistrationService>,

    pub config: Config,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url(),
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(create_app_state_with_store(config, store, prometheus_handle))
}

/// Wire the service graph over an already-connected store. Lets tests
/// bring their own in-memory database.
pub fn create_app_state_with_store(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let internal = InternalServiceClient::new(&config.collaborators);
    let profile = ProfileClient::new(internal.clone());
    let notification = NotificationClient::new(internal);

    let sessions: Arc<dyn SessionService> =
        Arc::new(SeaOrmSessionService::new(store.clone(), &config.security));
    let access: Arc<dyn AccessService> = Arc::new(SeaOrmAccessService::new(store.clone()));
    let registration: Arc<dyn RegistrationService> = Arc::new(SeaOrmRegistrationService::new(
        store.clone(),
        profile,
        notification,
        sessions.clone(),
        &config.security,
    ));

    Arc::new(AppState {
        store,
        sessions,
        access,
        registration,
        config,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/authorization/register", post(auth::register))
        .route("/authorization/login", post(auth::login))
        .route("/authorization/refresh", post(auth::refresh))
        .route("/authorization/logout", post(auth::logout))
        .route("/system/health", get(system::health))
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
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}
