use std::sync::Arc;

use chrono::NaiveDate;
use metrics::{counter, histogram};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::db::{with_write_transaction, DbPool};
use crate::entities::{plan, product, production};
use crate::errors::ServiceError;
use crate::services::consistency::{
    ensure_plans_exist, plan_reference_error, ProductionEntryPayload, ValidEntry,
};

/// Rows per INSERT statement inside a bulk submission
pub const BULK_INSERT_CHUNK: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertSummary {
    pub inserted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    /// Position of the element in the submitted array
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManySummary {
    pub updated: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Filters for the production detail listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionDataFilter {
    pub date: Option<NaiveDate>,
    pub shift: Option<String>,
    pub unit: Option<String>,
}

/// A production entry joined with its plan and product master data
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionDetail {
    pub production_id: i32,
    pub plan_id: i32,
    pub production_date: NaiveDate,
    pub shift: Option<String>,
    pub machine_number: Option<String>,
    pub quantity: i32,
    pub slip_type: Option<String>,
    pub remarks: Option<String>,
    pub operator_name: Option<String>,
    pub in_charge_name: Option<String>,
    pub code: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub customer_name: Option<String>,
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
}

/// Writes to the production ledger.
///
/// Every mutation validates its input before storage is touched and runs in
/// its own write transaction. `submit_bulk` is all-or-nothing while
/// `update_many` applies each element independently.
#[derive(Clone)]
pub struct ProductionLedgerService {
    db: Arc<DbPool>,
}

impl ProductionLedgerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Records a single production entry
    #[instrument(skip(self, payload), fields(plan_id = ?payload.plan_id))]
    pub async fn submit_one(
        &self,
        payload: ProductionEntryPayload,
    ) -> Result<production::Model, ServiceError> {
        let entry = payload.into_entry()?;

        let created = with_write_transaction(&self.db, "production.submit_one", |txn| {
            Box::pin(async move {
                ensure_plans_exist(txn, [entry.plan_id]).await?;
                entry
                    .into_active_model()
                    .insert(txn)
                    .await
                    .map_err(plan_reference_error)
            })
        })
        .await?;

        counter!("mps_ledger.entries_inserted", 1);
        info!(
            production_id = created.production_id,
            quantity = created.quantity,
            "Production entry recorded"
        );
        Ok(created)
    }

    /// Records a batch of entries atomically.
    ///
    /// The whole batch is validated before a transaction is opened; one bad
    /// element rejects the batch without any write.
    #[instrument(skip(self, payloads), fields(batch_size = payloads.len()))]
    pub async fn submit_bulk(
        &self,
        payloads: Vec<ProductionEntryPayload>,
    ) -> Result<BulkInsertSummary, ServiceError> {
        if payloads.is_empty() {
            return Err(ServiceError::invalid_input(
                "no production entries provided",
            ));
        }

        let entries = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| {
                payload.into_entry().map_err(|e| match e {
                    ServiceError::InvalidInput(msg) => {
                        ServiceError::invalid_input(format!("entry {index}: {msg}"))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<ValidEntry>, ServiceError>>()?;

        let total = entries.len();
        let started = std::time::Instant::now();

        let inserted = with_write_transaction(&self.db, "production.submit_bulk", |txn| {
            Box::pin(async move {
                ensure_plans_exist(txn, entries.iter().map(|e| e.plan_id)).await?;

                let mut inserted = 0usize;
                let mut rows = entries.into_iter().map(ValidEntry::into_active_model);
                loop {
                    let chunk: Vec<production::ActiveModel> =
                        rows.by_ref().take(BULK_INSERT_CHUNK).collect();
                    if chunk.is_empty() {
                        break;
                    }
                    let chunk_len = chunk.len();
                    production::Entity::insert_many(chunk)
                        .exec(txn)
                        .await
                        .map_err(plan_reference_error)?;
                    inserted += chunk_len;
                }
                Ok(inserted)
            })
        })
        .await?;

        debug_assert_eq!(inserted, total);
        counter!("mps_ledger.entries_inserted", inserted as u64);
        histogram!("mps_ledger.bulk_insert.duration", started.elapsed());
        info!(inserted, "Bulk production entries recorded");

        Ok(BulkInsertSummary { inserted })
    }

    /// Replaces every mutable field of an existing entry
    #[instrument(skip(self, payload), fields(production_id = ?payload.production_id))]
    pub async fn update(
        &self,
        payload: ProductionEntryPayload,
    ) -> Result<production::Model, ServiceError> {
        let (id, entry) = payload.into_update()?;
        self.apply_update(id, entry).await
    }

    async fn apply_update(
        &self,
        id: i32,
        entry: ValidEntry,
    ) -> Result<production::Model, ServiceError> {
        let updated = with_write_transaction(&self.db, "production.update", |txn| {
            Box::pin(async move {
                let existing = production::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(format!("production entry {id}")))?;
                ensure_plans_exist(txn, [entry.plan_id]).await?;
                entry
                    .apply_to(existing)
                    .update(txn)
                    .await
                    .map_err(plan_reference_error)
            })
        })
        .await?;

        info!(production_id = id, "Production entry updated");
        Ok(updated)
    }

    /// Best-effort update of many entries.
    ///
    /// Elements that are malformed, miss required fields, reference an
    /// unknown entry or plan are skipped and reported. A storage failure
    /// aborts the remaining elements; those already applied stay applied.
    #[instrument(skip(self, raw_entries), fields(batch_size = raw_entries.len()))]
    pub async fn update_many(
        &self,
        raw_entries: Vec<serde_json::Value>,
    ) -> Result<UpdateManySummary, ServiceError> {
        if raw_entries.is_empty() {
            return Err(ServiceError::invalid_input(
                "request body must be a non-empty array of production entries",
            ));
        }

        let mut summary = UpdateManySummary {
            updated: 0,
            skipped: Vec::new(),
        };

        for (index, raw) in raw_entries.into_iter().enumerate() {
            let outcome = match ProductionEntryPayload::from_json(raw)
                .and_then(ProductionEntryPayload::into_update)
            {
                Ok((id, entry)) => self.apply_update(id, entry).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => summary.updated += 1,
                Err(e) if e.is_storage_failure() => return Err(e),
                Err(e) => {
                    warn!(index, reason = %e, "Skipping production entry in batch update");
                    summary.skipped.push(SkippedEntry {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        counter!("mps_ledger.entries_updated", summary.updated as u64);
        if !summary.skipped.is_empty() {
            counter!("mps_ledger.entries_skipped", summary.skipped.len() as u64);
        }
        Ok(summary)
    }

    /// Removes one entry. Plans and orders are never touched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = production::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found(format!("production entry {id}")));
        }

        counter!("mps_ledger.entries_deleted", 1);
        info!(production_id = id, "Production entry deleted");
        Ok(())
    }

    /// Lists entries, optionally narrowed to a single id
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        production_id: Option<i32>,
    ) -> Result<Vec<production::Model>, ServiceError> {
        let rows = production::Entity::find()
            .apply_if(production_id, |query, id| {
                query.filter(production::Column::ProductionId.eq(id))
            })
            .order_by_asc(production::Column::ProductionId)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Entries joined with plan location/unit/customer and product attributes
    #[instrument(skip(self))]
    pub async fn production_details(
        &self,
        filter: ProductionDataFilter,
    ) -> Result<Vec<ProductionDetail>, ServiceError> {
        let rows = production::Entity::find()
            .select_only()
            .columns([
                production::Column::ProductionId,
                production::Column::PlanId,
                production::Column::ProductionDate,
                production::Column::Shift,
                production::Column::MachineNumber,
                production::Column::Quantity,
                production::Column::SlipType,
                production::Column::Remarks,
                production::Column::OperatorName,
                production::Column::InChargeName,
                production::Column::Code,
            ])
            .column_as(plan::Column::Location, "location")
            .column_as(plan::Column::Unit, "unit")
            .column_as(plan::Column::CustomerName, "customer_name")
            .column_as(product::Column::Model, "model")
            .column_as(product::Column::Material, "material")
            .column_as(product::Column::WireDia, "wire_dia")
            .column_as(product::Column::BallDia, "ball_dia")
            .column_as(product::Column::BallType, "ball_type")
            .column_as(product::Column::TipLength, "tip_length")
            .column_as(product::Column::TipType, "tip_type")
            .column_as(product::Column::BallRoughness, "ball_roughness")
            .column_as(product::Column::Ink, "ink")
            .column_as(product::Column::Ild, "ild")
            .join(JoinType::InnerJoin, production::Relation::Plan.def())
            .join(JoinType::LeftJoin, production::Relation::Product.def())
            .apply_if(filter.date, |query, date| {
                query.filter(production::Column::ProductionDate.eq(date))
            })
            .apply_if(filter.shift, |query, shift| {
                query.filter(production::Column::Shift.eq(shift))
            })
            .apply_if(filter.unit, |query, unit| {
                query.filter(plan::Column::Unit.eq(unit))
            })
            .order_by_asc(production::Column::ProductionDate)
            .order_by_asc(production::Column::ProductionId)
            .into_model::<ProductionDetail>()
            .all(&*self.db)
            .await?;
        Ok(rows)
    }
}
