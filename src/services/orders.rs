use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{with_write_transaction, DbPool};
use crate::entities::order_book;
use crate::errors::ServiceError;
use crate::services::consistency::{clean_text, lenient_date};

/// Body for creating or replacing a customer order
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default, alias = "Order_Date", alias = "OrderDate", deserialize_with = "lenient_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub order_date: Option<NaiveDate>,
    #[serde(default, alias = "Customer_Name", alias = "CustomerName")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "Customer_ID", alias = "CustomerId")]
    pub customer_id: Option<i32>,
    #[serde(default, alias = "Product")]
    pub product: Option<String>,
    #[serde(default, alias = "Order_Qty", alias = "OrderQty")]
    #[validate(range(min = 0, message = "orderQty must not be negative"))]
    pub order_qty: Option<i32>,
    #[serde(default, alias = "Order_Priority", alias = "OrderPriority")]
    pub order_priority: Option<String>,
    #[serde(
        default,
        alias = "Exp_Delivery_Date",
        alias = "ExpDeliveryDate",
        deserialize_with = "lenient_date"
    )]
    #[schema(value_type = Option<String>, format = Date)]
    pub exp_delivery_date: Option<NaiveDate>,
}

impl OrderRequest {
    fn write_onto(self, active: &mut order_book::ActiveModel) -> Result<(), ServiceError> {
        self.validate()?;
        active.order_date = Set(self.order_date);
        active.customer_name = Set(clean_text("customerName", self.customer_name)?);
        active.customer_id = Set(self.customer_id);
        active.product = Set(clean_text("product", self.product)?);
        active.order_priority = Set(clean_text("orderPriority", self.order_priority)?);
        active.exp_delivery_date = Set(self.exp_delivery_date);
        if let Some(order_qty) = self.order_qty {
            active.order_qty = Set(order_qty);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: OrderRequest) -> Result<order_book::Model, ServiceError> {
        let mut active = order_book::ActiveModel {
            order_qty: Set(0),
            ..Default::default()
        };
        request.write_onto(&mut active)?;

        let created = active.insert(&*self.db).await?;
        info!(order_id = created.order_id, "Order created");
        Ok(created)
    }

    /// Replaces an order's fields. An absent `orderQty` keeps the current quantity.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        order_id: i32,
        request: OrderRequest,
    ) -> Result<order_book::Model, ServiceError> {
        request.validate()?;

        let updated = with_write_transaction(&self.db, "order.update", |txn| {
            Box::pin(async move {
                let existing = order_book::Entity::find_by_id(order_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(format!("order {order_id}")))?;
                let mut active: order_book::ActiveModel = existing.into();
                request.write_onto(&mut active)?;
                Ok(active.update(txn).await?)
            })
        })
        .await?;

        info!(order_id, "Order updated");
        Ok(updated)
    }

    pub async fn list(&self) -> Result<Vec<order_book::Model>, ServiceError> {
        Ok(order_book::Entity::find()
            .order_by_asc(order_book::Column::OrderId)
            .all(&*self.db)
            .await?)
    }
}
