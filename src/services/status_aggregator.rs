//! Derived plan and order completion.
//!
//! Nothing here is stored: every call recomputes from the production ledger.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics::histogram;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::db::{begin_snapshot_read, rollback_logged, DbPool};
use crate::entities::{order_book, plan, production};
use crate::errors::ServiceError;

/// Plan status label counted towards an order's active plans (case-insensitive)
pub const ACTIVE_PLAN_STATUS: &str = "active";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatus {
    pub plan_id: i32,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub mc_no: Option<String>,
    pub status: Option<String>,
    pub customer_name: Option<String>,
    pub code: Option<String>,
    pub target_qty: i32,
    pub order_id: Option<i32>,
    /// Sum of all ledger quantities for the plan
    pub production: i64,
    pub pending_production: i64,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub order_id: i32,
    pub order_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_id: Option<i32>,
    pub product: Option<String>,
    pub order_qty: i32,
    pub order_priority: Option<String>,
    pub exp_delivery_date: Option<NaiveDate>,
    /// Production across every plan linked to the order
    pub production: i64,
    pub active_plans: i64,
    pub pending_quantity: i64,
    pub completion_percent: f64,
}

#[derive(Debug, FromQueryResult)]
struct PlanProductionRow {
    plan_id: i32,
    location: Option<String>,
    unit: Option<String>,
    start_date: Option<NaiveDate>,
    mc_no: Option<String>,
    status: Option<String>,
    customer_name: Option<String>,
    code: Option<String>,
    target_qty: i32,
    order_id: Option<i32>,
    produced: i64,
}

impl From<PlanProductionRow> for PlanStatus {
    fn from(row: PlanProductionRow) -> Self {
        let target = i64::from(row.target_qty);
        Self {
            plan_id: row.plan_id,
            location: row.location,
            unit: row.unit,
            start_date: row.start_date,
            mc_no: row.mc_no,
            status: row.status,
            customer_name: row.customer_name,
            code: row.code,
            target_qty: row.target_qty,
            order_id: row.order_id,
            production: row.produced,
            pending_production: pending(target, row.produced),
            completion_percent: completion_percent(row.produced, target),
        }
    }
}

/// Remaining quantity, never negative once production overshoots
pub fn pending(target: i64, produced: i64) -> i64 {
    (target - produced).max(0)
}

/// Percentage of `target` reached, rounded to two decimals.
///
/// A zero target counts as complete. Overproduction is reported as is, so
/// values above 100 are possible.
pub fn completion_percent(produced: i64, target: i64) -> f64 {
    if target <= 0 {
        return 100.0;
    }
    let raw = produced as f64 * 100.0 / target as f64;
    (raw * 100.0).round() / 100.0
}

fn quantity_sum() -> SimpleExpr {
    Expr::col((production::Entity, production::Column::Quantity)).sum()
}

#[derive(Clone)]
pub struct StatusAggregatorService {
    db: Arc<DbPool>,
}

impl StatusAggregatorService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// One row per plan, ordered by plan id
    #[instrument(skip(self))]
    pub async fn plan_statuses(&self) -> Result<Vec<PlanStatus>, ServiceError> {
        let started = std::time::Instant::now();
        let produced = SimpleExpr::from(Func::coalesce([
            quantity_sum(),
            SimpleExpr::from(Expr::val(0)),
        ]));

        let rows = plan::Entity::find()
            .select_only()
            .columns([
                plan::Column::PlanId,
                plan::Column::Location,
                plan::Column::Unit,
                plan::Column::StartDate,
                plan::Column::McNo,
                plan::Column::Status,
                plan::Column::CustomerName,
                plan::Column::Code,
                plan::Column::TargetQty,
                plan::Column::OrderId,
            ])
            .column_as(produced, "produced")
            .join(JoinType::LeftJoin, plan::Relation::Production.def())
            .group_by(plan::Column::PlanId)
            .order_by_asc(plan::Column::PlanId)
            .into_model::<PlanProductionRow>()
            .all(&*self.db)
            .await?;

        histogram!("mps_status.plan_statuses.duration", started.elapsed());
        debug!(plans = rows.len(), "Plan statuses computed");
        Ok(rows.into_iter().map(PlanStatus::from).collect())
    }

    /// One row per order, ordered by order id.
    ///
    /// The three reads share a read-only snapshot so a concurrent ledger
    /// write cannot land between them.
    #[instrument(skip(self))]
    pub async fn order_statuses(&self) -> Result<Vec<OrderStatus>, ServiceError> {
        let started = std::time::Instant::now();
        let txn = begin_snapshot_read(&self.db).await?;

        let inputs = match load_order_inputs(&txn).await {
            Ok(inputs) => inputs,
            Err(e) => {
                rollback_logged(txn, "status.order_statuses").await;
                return Err(e.into());
            }
        };
        txn.commit().await?;

        let (orders, produced, active) = inputs;
        let produced: HashMap<i32, i64> = produced.into_iter().collect();
        let active: HashMap<i32, i64> = active.into_iter().collect();

        let statuses: Vec<OrderStatus> = orders
            .into_iter()
            .map(|order| {
                let production = produced.get(&order.order_id).copied().unwrap_or(0);
                let target = i64::from(order.order_qty);
                OrderStatus {
                    order_id: order.order_id,
                    order_date: order.order_date,
                    customer_name: order.customer_name,
                    customer_id: order.customer_id,
                    product: order.product,
                    order_qty: order.order_qty,
                    order_priority: order.order_priority,
                    exp_delivery_date: order.exp_delivery_date,
                    production,
                    active_plans: active.get(&order.order_id).copied().unwrap_or(0),
                    pending_quantity: pending(target, production),
                    completion_percent: completion_percent(production, target),
                }
            })
            .collect();

        histogram!("mps_status.order_statuses.duration", started.elapsed());
        debug!(orders = statuses.len(), "Order statuses computed");
        Ok(statuses)
    }
}

type OrderInputs = (Vec<order_book::Model>, Vec<(i32, i64)>, Vec<(i32, i64)>);

async fn load_order_inputs<C: ConnectionTrait>(conn: &C) -> Result<OrderInputs, DbErr> {
    let orders = order_book::Entity::find()
        .order_by_asc(order_book::Column::OrderId)
        .all(conn)
        .await?;

    let produced = production::Entity::find()
        .select_only()
        .column(plan::Column::OrderId)
        .column_as(quantity_sum(), "produced")
        .join(JoinType::InnerJoin, production::Relation::Plan.def())
        .filter(plan::Column::OrderId.is_not_null())
        .group_by(plan::Column::OrderId)
        .into_tuple::<(i32, i64)>()
        .all(conn)
        .await?;

    let active = plan::Entity::find()
        .select_only()
        .column(plan::Column::OrderId)
        .column_as(Expr::col(plan::Column::PlanId).count(), "active_plans")
        .filter(plan::Column::OrderId.is_not_null())
        .filter(Expr::expr(Func::lower(Expr::col(plan::Column::Status))).eq(ACTIVE_PLAN_STATUS))
        .group_by(plan::Column::OrderId)
        .into_tuple::<(i32, i64)>()
        .all(conn)
        .await?;

    Ok((orders, produced, active))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_is_complete() {
        assert_eq!(completion_percent(0, 0), 100.0);
        assert_eq!(completion_percent(12, 0), 100.0);
    }

    #[test]
    fn percent_is_rounded_to_two_places() {
        assert_eq!(completion_percent(1, 3), 33.33);
        assert_eq!(completion_percent(2, 3), 66.67);
        assert_eq!(completion_percent(50, 100), 50.0);
    }

    #[test]
    fn overproduction_is_not_capped_but_pending_is_floored() {
        assert_eq!(completion_percent(150, 100), 150.0);
        assert_eq!(pending(100, 150), 0);
        assert_eq!(pending(100, 40), 60);
    }

    #[test]
    fn plan_row_without_entries_reports_zero() {
        let status = PlanStatus::from(PlanProductionRow {
            plan_id: 3,
            location: None,
            unit: Some("U1".into()),
            start_date: None,
            mc_no: None,
            status: Some("Active".into()),
            customer_name: None,
            code: None,
            target_qty: 40,
            order_id: None,
            produced: 0,
        });
        assert_eq!(status.production, 0);
        assert_eq!(status.pending_production, 40);
        assert_eq!(status.completion_percent, 0.0);
    }
}
