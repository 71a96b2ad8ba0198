use crate::{
    entities::plan,
    errors::ServiceError,
    handlers::common::{parse_id, MessageResponse, Payload},
    services::plans::PlanRequest,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:plan_id", put(update_plan))
        .route("/plan-data", get(list_plans))
        .route("/plan-options", get(plan_options))
}

#[utoipa::path(
    post,
    path = "/api/plans",
    request_body = PlanRequest,
    responses(
        (status = 201, description = "Plan created", body = MessageResponse<plan::Model>),
        (status = 400, description = "Invalid field or unknown orderId", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plans"
)]
pub async fn create_plan(
    State(state): State<AppState>,
    Payload(request): Payload<PlanRequest>,
) -> Result<(StatusCode, Json<MessageResponse<plan::Model>>), ServiceError> {
    let created = state.services.plans.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_result("Plan created successfully", created)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/plans/{plan_id}",
    params(("plan_id" = i32, Path, description = "Plan id")),
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = MessageResponse<plan::Model>),
        (status = 400, description = "Invalid field or unknown orderId", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such plan", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plans"
)]
pub async fn update_plan(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Payload(request): Payload<PlanRequest>,
) -> Result<Json<MessageResponse<plan::Model>>, ServiceError> {
    let plan_id = parse_id("plan_id", &raw_id)?;
    let updated = state.services.plans.update(plan_id, request).await?;
    Ok(Json(MessageResponse::with_result(
        "Plan updated successfully",
        updated,
    )))
}

/// All plan rows. Also served as `/api/plan-data`.
#[utoipa::path(
    get,
    path = "/api/plans",
    responses(
        (status = 200, description = "Plans ordered by id", body = Vec<plan::Model>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plans"
)]
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<plan::Model>>, ServiceError> {
    Ok(Json(state.services.plans.list().await?))
}

/// Distinct units, for filter drop-downs
#[utoipa::path(
    get,
    path = "/api/plan-options",
    responses(
        (status = 200, description = "Distinct unit labels", body = Vec<String>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "plans"
)]
pub async fn plan_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(state.services.plans.units().await?))
}
