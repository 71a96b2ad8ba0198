use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DbErr, EntityTrait, QueryOrder, QuerySelect, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{with_write_transaction, DbPool};
use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::consistency::clean_text;

/// Product master data as submitted by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(default, alias = "Item_Code", alias = "ItemCode")]
    #[validate(length(min = 1, max = 64, message = "itemCode must be 1-64 characters"))]
    pub item_code: Option<String>,
    #[serde(default, alias = "Model")]
    pub model: Option<String>,
    #[serde(default, alias = "Material")]
    pub material: Option<String>,
    #[serde(default, alias = "Wire_Dia", alias = "WireDia")]
    pub wire_dia: Option<String>,
    #[serde(default, alias = "Ball_Dia", alias = "BallDia")]
    pub ball_dia: Option<String>,
    #[serde(default, alias = "Ball_Type", alias = "BallType")]
    pub ball_type: Option<String>,
    #[serde(default, alias = "Tip_Length", alias = "TipLength")]
    pub tip_length: Option<String>,
    #[serde(default, alias = "Tip_Type", alias = "TipType")]
    pub tip_type: Option<String>,
    #[serde(default, alias = "Ball_Roughness", alias = "BallRoughness")]
    pub ball_roughness: Option<String>,
    #[serde(default, alias = "Ink")]
    pub ink: Option<String>,
    #[serde(default, alias = "ILD", alias = "Ild")]
    pub ild: Option<String>,
    #[serde(default, alias = "Test_Parameter", alias = "TestParameter")]
    pub test_parameter: Option<String>,
}

impl ProductRequest {
    fn write_onto(self, active: &mut product::ActiveModel) -> Result<(), ServiceError> {
        self.validate()?;
        let item_code = self
            .item_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .ok_or_else(|| ServiceError::invalid_input("itemCode is required"))?;

        active.item_code = Set(item_code);
        active.model = Set(clean_text("model", self.model)?);
        active.material = Set(clean_text("material", self.material)?);
        active.wire_dia = Set(clean_text("wireDia", self.wire_dia)?);
        active.ball_dia = Set(clean_text("ballDia", self.ball_dia)?);
        active.ball_type = Set(clean_text("ballType", self.ball_type)?);
        active.tip_length = Set(clean_text("tipLength", self.tip_length)?);
        active.tip_type = Set(clean_text("tipType", self.tip_type)?);
        active.ball_roughness = Set(clean_text("ballRoughness", self.ball_roughness)?);
        active.ink = Set(clean_text("ink", self.ink)?);
        active.ild = Set(clean_text("ild", self.ild)?);
        active.test_parameter = Set(clean_text("testParameter", self.test_parameter)?);
        Ok(())
    }
}

fn duplicate_item_code(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::invalid_input("itemCode already exists")
        }
        _ => ServiceError::db_error(err),
    }
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: ProductRequest) -> Result<product::Model, ServiceError> {
        let mut active = <product::ActiveModel as Default>::default();
        request.write_onto(&mut active)?;

        let created = active.insert(&*self.db).await.map_err(duplicate_item_code)?;
        info!(product_id = created.product_id, item_code = %created.item_code, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        product_id: i32,
        request: ProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let updated = with_write_transaction(&self.db, "product.update", |txn| {
            Box::pin(async move {
                let existing = product::Entity::find_by_id(product_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(format!("product {product_id}")))?;
                let mut active: product::ActiveModel = existing.into();
                request.write_onto(&mut active)?;
                Ok(active.update(txn).await.map_err(duplicate_item_code)?)
            })
        })
        .await?;

        info!(product_id, "Product updated");
        Ok(updated)
    }

    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .order_by_asc(product::Column::ProductId)
            .all(&*self.db)
            .await?)
    }

    pub async fn item_codes(&self) -> Result<Vec<String>, ServiceError> {
        Ok(product::Entity::find()
            .select_only()
            .column(product::Column::ItemCode)
            .distinct()
            .order_by_asc(product::Column::ItemCode)
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
    fn blank_item_code_is_rejected() {
        let request = ProductRequest {
            item_code: Some("   ".into()),
            ..Default::default()
        };
        let mut active = <product::ActiveModel as Default>::default();
        assert_matches!(
            request.write_onto(&mut active),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn legacy_keys_map_onto_fields() {
        let request: ProductRequest = serde_json::from_value(serde_json::json!({
            "Item_Code": "BP-0.7",
            "Wire_Dia": "0.7",
            "ILD": "120"
        }))
        .unwrap();
        assert_eq!(request.item_code.as_deref(), Some("BP-0.7"));
        assert_eq!(request.wire_dia.as_deref(), Some("0.7"));
        assert_eq!(request.ild.as_deref(), Some("120"));
    }
}
