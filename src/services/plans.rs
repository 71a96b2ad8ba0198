use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{with_write_transaction, DbPool};
use crate::entities::plan;
use crate::errors::ServiceError;
use crate::services::consistency::{clean_text, ensure_order_exists, lenient_date};

/// Body for creating or replacing a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default, alias = "Location")]
    pub location: Option<String>,
    #[serde(default, alias = "Unit")]
    pub unit: Option<String>,
    #[serde(default, alias = "Start_date", alias = "StartDate", deserialize_with = "lenient_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, alias = "Mc_no", alias = "McNo")]
    pub mc_no: Option<String>,
    #[serde(default, alias = "Status")]
    pub status: Option<String>,
    #[serde(default, alias = "Customer_name", alias = "CustomerName")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "Code")]
    pub code: Option<String>,
    #[serde(default, alias = "Target_Qty", alias = "TargetQty")]
    #[validate(range(min = 0, message = "targetQty must not be negative"))]
    pub target_qty: Option<i32>,
    #[serde(default, alias = "Order_Id", alias = "Order_ID", alias = "OrderId")]
    #[validate(range(min = 1, message = "orderId must be a positive integer"))]
    pub order_id: Option<i32>,
}

#[derive(Debug)]
struct PlanFields {
    location: Option<String>,
    unit: Option<String>,
    start_date: Option<NaiveDate>,
    mc_no: Option<String>,
    status: Option<String>,
    customer_name: Option<String>,
    code: Option<String>,
    target_qty: Option<i32>,
    order_id: Option<i32>,
}

impl PlanRequest {
    fn into_fields(self) -> Result<PlanFields, ServiceError> {
        self.validate()?;
        Ok(PlanFields {
            location: clean_text("location", self.location)?,
            unit: clean_text("unit", self.unit)?,
            start_date: self.start_date,
            mc_no: clean_text("mcNo", self.mc_no)?,
            status: clean_text("status", self.status)?,
            customer_name: clean_text("customerName", self.customer_name)?,
            code: clean_text("code", self.code)?,
            target_qty: self.target_qty,
            order_id: self.order_id,
        })
    }
}

impl PlanFields {
    fn write_onto(self, active: &mut plan::ActiveModel) {
        active.location = Set(self.location);
        active.unit = Set(self.unit);
        active.start_date = Set(self.start_date);
        active.mc_no = Set(self.mc_no);
        active.status = Set(self.status);
        active.customer_name = Set(self.customer_name);
        active.code = Set(self.code);
        active.order_id = Set(self.order_id);
        if let Some(target_qty) = self.target_qty {
            active.target_qty = Set(target_qty);
        }
    }
}

/// Plan master records
#[derive(Clone)]
pub struct PlanService {
    db: Arc<DbPool>,
}

impl PlanService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: PlanRequest) -> Result<plan::Model, ServiceError> {
        let fields = request.into_fields()?;

        let created = with_write_transaction(&self.db, "plan.create", |txn| {
            Box::pin(async move {
                ensure_order_exists(txn, fields.order_id).await?;
                let mut active = plan::ActiveModel {
                    target_qty: Set(0),
                    ..Default::default()
                };
                fields.write_onto(&mut active);
                Ok(active.insert(txn).await?)
            })
        })
        .await?;

        info!(plan_id = created.plan_id, "Plan created");
        Ok(created)
    }

    /// Replaces the descriptive fields of a plan. An absent `targetQty`
    /// keeps the current target.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        plan_id: i32,
        request: PlanRequest,
    ) -> Result<plan::Model, ServiceError> {
        let fields = request.into_fields()?;

        let updated = with_write_transaction(&self.db, "plan.update", |txn| {
            Box::pin(async move {
                let existing = plan::Entity::find_by_id(plan_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(format!("plan {plan_id}")))?;
                ensure_order_exists(txn, fields.order_id).await?;
                let mut active: plan::ActiveModel = existing.into();
                fields.write_onto(&mut active);
                Ok(active.update(txn).await?)
            })
        })
        .await?;

        info!(plan_id, "Plan updated");
        Ok(updated)
    }

    pub async fn list(&self) -> Result<Vec<plan::Model>, ServiceError> {
        Ok(plan::Entity::find()
            .order_by_asc(plan::Column::PlanId)
            .all(&*self.db)
            .await?)
    }

    /// Distinct, non-empty unit labels used by existing plans
    pub async fn units(&self) -> Result<Vec<String>, ServiceError> {
        Ok(plan::Entity::find()
            .select_only()
            .column(plan::Column::Unit)
            .distinct()
            .filter(plan::Column::Unit.is_not_null())
            .filter(plan::Column::Unit.ne(""))
            .order_by_asc(plan::Column::Unit)
            .into_tuple::<String>()
            .all(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn legacy_field_names_are_accepted() {
        let request: PlanRequest = serde_json::from_value(serde_json::json!({
            "Location": "Plant 2",
            "Unit": "U-4",
            "Start_date": "2024-06-03",
            "Target_Qty": 1200,
            "Order_Id": 7
        }))
        .unwrap();

        assert_eq!(request.unit.as_deref(), Some("U-4"));
        assert_eq!(request.target_qty, Some(1200));
        assert_eq!(request.order_id, Some(7));
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 6, 3));
    }

    #[test]
    fn negative_target_is_rejected() {
        let request = PlanRequest {
            target_qty: Some(-1),
            ..Default::default()
        };
        assert_matches!(request.into_fields(), Err(ServiceError::InvalidInput(_)));
    }
}
