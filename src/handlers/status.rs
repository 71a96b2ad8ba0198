use crate::{
    errors::ServiceError,
    services::status_aggregator::{OrderStatus, PlanStatus},
    AppState,
};
use axum::{extract::State, routing::get, Json, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plan-status", get(plan_status))
        .route("/order-status", get(order_status))
}

/// Completion status of every plan, derived from the production ledger
#[utoipa::path(
    get,
    path = "/api/plan-status",
    responses(
        (status = 200, description = "One row per plan", body = Vec<PlanStatus>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "status"
)]
pub async fn plan_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanStatus>>, ServiceError> {
    Ok(Json(state.services.status.plan_statuses().await?))
}

/// Completion status of every order across its linked plans
#[utoipa::path(
    get,
    path = "/api/order-status",
    responses(
        (status = 200, description = "One row per order", body = Vec<OrderStatus>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "status"
)]
pub async fn order_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderStatus>>, ServiceError> {
    Ok(Json(state.services.status.order_statuses().await?))
}
