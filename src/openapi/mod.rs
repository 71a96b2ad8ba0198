use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MPS API",
        version = "0.1.0",
        description = r#"
# Manufacturing Planning API

Production plans, customer orders and the production ledger recorded against
them. Plan and order completion is derived from the ledger on every read.

## Authentication

Obtain a token from `POST /login` and send it on every `/api` request:

```
Authorization: Bearer <token>
```

A missing token is answered with 401, an invalid or expired one with 403.

## Errors

```json
{
  "error": "Bad Request",
  "message": "Invalid input: planId, productionDate and quantity are required",
  "request_id": "6f1c...",
  "timestamp": "2024-06-01T08:00:00Z"
}
```
        "#
    ),
    tags(
        (name = "productions", description = "Production ledger"),
        (name = "status", description = "Derived plan and order completion"),
        (name = "plans", description = "Plan master records"),
        (name = "orders", description = "Customer orders"),
        (name = "products", description = "Product master data"),
        (name = "auth", description = "Login"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::auth::login_handler,

        crate::handlers::productions::create_production,
        crate::handlers::productions::bulk_create_productions,
        crate::handlers::productions::list_productions,
        crate::handlers::productions::update_production,
        crate::handlers::productions::update_all_productions,
        crate::handlers::productions::delete_production,
        crate::handlers::productions::production_data,

        crate::handlers::status::plan_status,
        crate::handlers::status::order_status,

        crate::handlers::plans::create_plan,
        crate::handlers::plans::update_plan,
        crate::handlers::plans::list_plans,
        crate::handlers::plans::plan_options,

        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::list_orders,

        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::list_products,
        crate::handlers::products::product_options,

        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
    ),
    components(
        schemas(
            crate::entities::plan::Model,
            crate::entities::order_book::Model,
            crate::entities::production::Model,
            crate::entities::product::Model,
            crate::services::consistency::ProductionEntryPayload,
            crate::services::production_ledger::BulkInsertSummary,
            crate::services::production_ledger::UpdateManySummary,
            crate::services::production_ledger::SkippedEntry,
            crate::services::production_ledger::ProductionDetail,
            crate::services::status_aggregator::PlanStatus,
            crate::services::status_aggregator::OrderStatus,
            crate::services::plans::PlanRequest,
            crate::services::orders::OrderRequest,
            crate::services::products::ProductRequest,
            crate::auth::LoginCredentials,
            crate::auth::TokenResponse,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
