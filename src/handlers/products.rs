use crate::{
    entities::product,
    errors::ServiceError,
    handlers::common::{parse_id, MessageResponse, Payload},
    services::products::ProductRequest,
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
        .route("/products", get(list_products).post(create_product))
        .route("/products/:product_id", put(update_product))
        .route("/product-options", get(product_options))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = MessageResponse<product::Model>),
        (status = 400, description = "Missing itemCode or duplicate code", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Payload(request): Payload<ProductRequest>,
) -> Result<(StatusCode, Json<MessageResponse<product::Model>>), ServiceError> {
    let created = state.services.products.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_result(
            "Product created successfully",
            created,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{product_id}",
    params(("product_id" = i32, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = MessageResponse<product::Model>),
        (status = 400, description = "Invalid field", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Payload(request): Payload<ProductRequest>,
) -> Result<Json<MessageResponse<product::Model>>, ServiceError> {
    let product_id = parse_id("product_id", &raw_id)?;
    let updated = state.services.products.update(product_id, request).await?;
    Ok(Json(MessageResponse::with_result(
        "Product updated successfully",
        updated,
    )))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Product master data", body = Vec<product::Model>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<product::Model>>, ServiceError> {
    Ok(Json(state.services.products.list().await?))
}

/// Distinct item codes
#[utoipa::path(
    get,
    path = "/api/product-options",
    responses(
        (status = 200, description = "Item codes", body = Vec<String>),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn product_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(state.services.products.item_codes().await?))
}
