use crate::{
    entities::production,
    errors::ServiceError,
    handlers::common::{parse_id, MessageResponse, Payload},
    services::{
        consistency::{parse_date, ProductionEntryPayload},
        production_ledger::{
            BulkInsertSummary, ProductionDataFilter, ProductionDetail, UpdateManySummary,
        },
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/productions", post(create_production).get(list_productions))
        .route("/productions/bulk", post(bulk_create_productions))
        .route("/productions/update", post(update_production))
        .route("/productions/updateAll", post(update_all_productions))
        .route("/productions/:id", delete(delete_production))
        .route("/production-data", get(production_data))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProductionQuery {
    /// Restrict the listing to one entry
    #[serde(alias = "ProductionId")]
    pub production_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductionDataQuery {
    /// Production date, `YYYY-MM-DD`
    pub date: Option<String>,
    pub shift: Option<String>,
    pub unit: Option<String>,
}

impl ProductionDataQuery {
    fn into_filter(self) -> Result<ProductionDataFilter, ServiceError> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let date = non_empty(self.date)
            .map(|raw| parse_date(&raw).map_err(ServiceError::invalid_input))
            .transpose()?;
        Ok(ProductionDataFilter {
            date,
            shift: non_empty(self.shift),
            unit: non_empty(self.unit),
        })
    }
}

/// Record one production entry
#[utoipa::path(
    post,
    path = "/api/productions",
    request_body = ProductionEntryPayload,
    responses(
        (status = 201, description = "Production entry created", body = MessageResponse<production::Model>),
        (status = 400, description = "Missing or invalid field", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn create_production(
    State(state): State<AppState>,
    Payload(payload): Payload<ProductionEntryPayload>,
) -> Result<(StatusCode, Json<MessageResponse<production::Model>>), ServiceError> {
    let created = state.services.ledger.submit_one(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_result(
            "Production entry created successfully",
            created,
        )),
    ))
}

/// Record a batch of entries atomically
#[utoipa::path(
    post,
    path = "/api/productions/bulk",
    request_body = Vec<ProductionEntryPayload>,
    responses(
        (status = 201, description = "All entries recorded", body = MessageResponse<BulkInsertSummary>),
        (status = 400, description = "Empty batch or an invalid entry; nothing was written", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Storage failure; batch rolled back", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn bulk_create_productions(
    State(state): State<AppState>,
    Payload(payloads): Payload<Vec<ProductionEntryPayload>>,
) -> Result<(StatusCode, Json<MessageResponse<BulkInsertSummary>>), ServiceError> {
    let summary = state.services.ledger.submit_bulk(payloads).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_result(
            "Bulk production entries created successfully",
            summary,
        )),
    ))
}

/// List production entries
#[utoipa::path(
    get,
    path = "/api/productions",
    params(ProductionQuery),
    responses(
        (status = 200, description = "Production entries", body = Vec<production::Model>),
        (status = 400, description = "Non-numeric productionId", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn list_productions(
    State(state): State<AppState>,
    Query(query): Query<ProductionQuery>,
) -> Result<Json<Vec<production::Model>>, ServiceError> {
    let production_id = query
        .production_id
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_id("productionId", &raw))
        .transpose()?;
    let entries = state.services.ledger.list(production_id).await?;
    Ok(Json(entries))
}

/// Replace the fields of one entry
#[utoipa::path(
    post,
    path = "/api/productions/update",
    request_body = ProductionEntryPayload,
    responses(
        (status = 200, description = "Entry updated", body = MessageResponse<production::Model>),
        (status = 400, description = "Missing or invalid field", body = crate::errors::ErrorResponse),
        (status = 404, description = "No entry with that productionId", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn update_production(
    State(state): State<AppState>,
    Payload(payload): Payload<ProductionEntryPayload>,
) -> Result<Json<MessageResponse<production::Model>>, ServiceError> {
    let updated = state.services.ledger.update(payload).await?;
    Ok(Json(MessageResponse::with_result(
        "Production entry updated successfully",
        updated,
    )))
}

/// Best-effort update of many entries; invalid elements are skipped
#[utoipa::path(
    post,
    path = "/api/productions/updateAll",
    request_body = Vec<ProductionEntryPayload>,
    responses(
        (status = 200, description = "Batch processed", body = MessageResponse<UpdateManySummary>),
        (status = 400, description = "Empty or non-array body", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn update_all_productions(
    State(state): State<AppState>,
    Payload(entries): Payload<Vec<serde_json::Value>>,
) -> Result<Json<MessageResponse<UpdateManySummary>>, ServiceError> {
    let summary = state.services.ledger.update_many(entries).await?;
    let message = if summary.skipped.is_empty() {
        "All production entries updated successfully".to_string()
    } else {
        format!(
            "{} production entries updated, {} skipped",
            summary.updated,
            summary.skipped.len()
        )
    };
    Ok(Json(MessageResponse::with_result(message, summary)))
}

/// Delete one entry
#[utoipa::path(
    delete,
    path = "/api/productions/{id}",
    params(("id" = i32, Path, description = "Production entry id")),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 400, description = "Non-numeric id", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such entry", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn delete_production(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse<()>>, ServiceError> {
    let id = parse_id("id", &raw_id)?;
    state.services.ledger.delete(id).await?;
    Ok(Json(MessageResponse::message(
        "Production entry deleted successfully",
    )))
}

/// Production entries joined with plan and product details
#[utoipa::path(
    get,
    path = "/api/production-data",
    params(ProductionDataQuery),
    responses(
        (status = 200, description = "Joined production rows", body = Vec<ProductionDetail>),
        (status = 400, description = "Invalid date filter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "productions"
)]
pub async fn production_data(
    State(state): State<AppState>,
    Query(query): Query<ProductionDataQuery>,
) -> Result<Json<Vec<ProductionDetail>>, ServiceError> {
    let rows = state
        .services
        .ledger
        .production_details(query.into_filter()?)
        .await?;
    Ok(Json(rows))
}
