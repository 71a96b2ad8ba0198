use crate::{
    entities::order_book,
    errors::ServiceError,
    handlers::common::{parse_id, MessageResponse, Payload},
    services::orders::OrderRequest,
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
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:order_id", put(update_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order created", body = MessageResponse<order_book::Model>),
        (status = 400, description = "Invalid field", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Payload(request): Payload<OrderRequest>,
) -> Result<(StatusCode, Json<MessageResponse<order_book::Model>>), ServiceError> {
    let created = state.services.orders.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_result("Order created successfully", created)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/orders/{order_id}",
    params(("order_id" = i32, Path, description = "Order id")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Order updated", body = MessageResponse<order_book::Model>),
        (status = 400, description = "Invalid field", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such order", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Payload(request): Payload<OrderRequest>,
) -> Result<Json<MessageResponse<order_book::Model>>, ServiceError> {
    let order_id = parse_id("order_id", &raw_id)?;
    let updated = state.services.orders.update(order_id, request).await?;
    Ok(Json(MessageResponse::with_result(
        "Order updated successfully",
        updated,
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders ordered by id", body = Vec<order_book::Model>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<order_book::Model>>, ServiceError> {
    Ok(Json(state.services.orders.list().await?))
}
