//! Manufacturing planning API
//!
//! Plans, customer orders and the production ledger recorded against them.
//! Plan and order completion is derived from the ledger on every read.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::post,
    Router,
};
use http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::handlers::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        Self {
            services: AppServices::new(db.clone()),
            db,
            config,
            auth,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Every route under `/api`; all of them require a bearer token
pub fn api_routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .merge(handlers::productions::routes())
        .merge(handlers::status::routes())
        .merge(handlers::plans::routes())
        .merge(handlers::orders::routes())
        .merge(handlers::products::routes())
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            auth::auth_middleware,
        ))
}

/// Build CORS layer from config
pub fn cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            development = cfg.is_development(),
            "Using permissive CORS because explicit origins were not configured"
        );
        Ok(CorsLayer::permissive())
    } else {
        anyhow::bail!(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
        )
    }
}

/// Full application router: health, login, the authenticated API and Swagger UI
pub fn app_router(state: AppState) -> anyhow::Result<Router> {
    let cfg = state.config.clone();

    let app = Router::<AppState>::new()
        .merge(handlers::health::routes())
        .route("/login", post(auth::login_handler))
        .nest("/api", api_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(cfg.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&cfg)?)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "k".repeat(64),
            "127.0.0.1".into(),
            8080,
            environment.into(),
        )
    }

    #[test]
    fn production_without_cors_origins_is_refused() {
        assert!(cors_layer(&config("production")).is_err());
        assert!(cors_layer(&config("development")).is_ok());

        let mut cfg = config("production");
        cfg.cors_allowed_origins = Some("https://mps.example.com, ".into());
        assert!(cors_layer(&cfg).is_ok());
    }
}
