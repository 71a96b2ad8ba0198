use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product master data, keyed by item code
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "product")]
#[serde(rename_all = "camelCase")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i32,
    #[sea_orm(unique)]
    pub item_code: String,
    pub model: Option<String>,
    pub material: Option<String>,
    pub wire_dia: Option<String>,
    pub ball_dia: Option<String>,
    pub ball_type: Option<String>,
    pub tip_length: Option<String>,
    pub tip_type: Option<String>,
    pub ball_roughness: Option<String>,
    pub ink: Option<String>,
    pub ild: Option<String>,
    pub test_parameter: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
