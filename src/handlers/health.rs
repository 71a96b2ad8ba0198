use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

use crate::handlers::AppState;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ComponentHealth>,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

fn base_response(status: ComponentStatus) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: get_uptime_secs(),
        database: None,
    }
}

/// Liveness probe; never touches the database
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is alive", body = HealthResponse)),
    tag = "health"
)]
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(base_response(ComponentStatus::Up))
}

/// Readiness probe; pings the connection pool
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_check_start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let latency_ms = db_check_start.elapsed().as_millis() as u64;

    let (status, code) = match db_result {
        Ok(()) => (ComponentStatus::Up, StatusCode::OK),
        Err(_) => (ComponentStatus::Down, StatusCode::SERVICE_UNAVAILABLE),
    };

    let mut body = base_response(status);
    body.database = Some(ComponentHealth {
        status,
        latency_ms: Some(latency_ms),
    });
    (code, Json(body))
}
