use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A scheduled manufacturing run against a target quantity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "plan_table")]
#[serde(rename_all = "camelCase")]
#[schema(as = Plan)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub plan_id: i32,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub mc_no: Option<String>,
    /// Free-form label; "active" (any case) counts towards an order's active plans
    pub status: Option<String>,
    pub customer_name: Option<String>,
    pub code: Option<String>,
    pub target_qty: i32,
    /// Order fulfilled by this plan, if any
    pub order_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_book::Entity",
        from = "Column::OrderId",
        to = "super::order_book::Column::OrderId",
        on_delete = "SetNull"
    )]
    OrderBook,
    #[sea_orm(has_many = "super::production::Entity")]
    Production,
}

impl Related<super::order_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderBook.def()
    }
}

impl Related<super::production::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Production.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
