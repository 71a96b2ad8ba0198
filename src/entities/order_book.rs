use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Customer order, fulfilled by zero or more plans
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "order_book")]
#[serde(rename_all = "camelCase")]
#[schema(as = Order)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub order_id: i32,
    pub order_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_id: Option<i32>,
    pub product: Option<String>,
    pub order_qty: i32,
    pub order_priority: Option<String>,
    pub exp_delivery_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::plan::Entity")]
    Plan,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
