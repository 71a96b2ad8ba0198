use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One ledger row: a quantity produced against a plan on a given date
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "production")]
#[serde(rename_all = "camelCase")]
#[schema(as = ProductionEntry)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub production_id: i32,
    pub plan_id: i32,
    pub production_date: NaiveDate,
    pub shift: Option<String>,
    pub machine_number: Option<String>,
    pub code: Option<String>,
    /// Always strictly positive
    pub quantity: i32,
    pub slip_type: Option<String>,
    pub remarks: Option<String>,
    pub operator_name: Option<String>,
    pub in_charge_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::PlanId",
        on_delete = "Restrict"
    )]
    Plan,
    // Join only, there is no constraint behind it
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::Code",
        to = "super::product::Column::ItemCode"
    )]
    Product,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
