//! Checks every ledger write has to pass.
//!
//! Payload shape and value checks run before any storage access. The
//! referential check runs inside the caller's write transaction, with the
//! `production.plan_id` foreign key as the database-level backstop.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    SqlErr,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{order_book, plan, production};
use crate::errors::ServiceError;

const MAX_TEXT_LEN: u64 = 255;

/// Production entry as submitted by clients.
///
/// Every field is optional at the wire level so that missing values are
/// reported as `InvalidInput` rather than a deserialization failure. Legacy
/// PascalCase keys (`PlanID`, `ProductionDate`, ...) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntryPayload {
    /// Required for updates only
    #[serde(default, alias = "ProductionId", alias = "ProductionID")]
    #[validate(range(min = 1, message = "productionId must be a positive integer"))]
    pub production_id: Option<i32>,
    #[serde(default, alias = "PlanID", alias = "PlanId")]
    #[validate(range(min = 1, message = "planId must be a positive integer"))]
    pub plan_id: Option<i32>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[serde(default, alias = "ProductionDate", deserialize_with = "lenient_date")]
    #[schema(value_type = Option<String>, format = Date, example = "2024-06-01")]
    pub production_date: Option<NaiveDate>,
    #[serde(default, alias = "Shift")]
    #[validate(length(max = 32))]
    pub shift: Option<String>,
    #[serde(default, alias = "MachineNumber")]
    #[validate(length(max = 64))]
    pub machine_number: Option<String>,
    #[serde(default, alias = "Code")]
    #[validate(length(max = 64))]
    pub code: Option<String>,
    #[serde(default, alias = "Quantity")]
    #[validate(range(min = 1, message = "quantity must be greater than zero"))]
    pub quantity: Option<i32>,
    #[serde(default, alias = "SlipType")]
    #[validate(length(max = 64))]
    pub slip_type: Option<String>,
    #[serde(default, alias = "Remarks")]
    #[validate(length(max = 255))]
    pub remarks: Option<String>,
    #[serde(default, alias = "OperatorName")]
    #[validate(length(max = 255))]
    pub operator_name: Option<String>,
    #[serde(default, alias = "InChargeName")]
    #[validate(length(max = 255))]
    pub in_charge_name: Option<String>,
}

/// A production entry that passed payload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntry {
    pub plan_id: i32,
    pub production_date: NaiveDate,
    pub quantity: i32,
    pub shift: Option<String>,
    pub machine_number: Option<String>,
    pub code: Option<String>,
    pub slip_type: Option<String>,
    pub remarks: Option<String>,
    pub operator_name: Option<String>,
    pub in_charge_name: Option<String>,
}

impl ProductionEntryPayload {
    pub fn from_json(value: serde_json::Value) -> Result<Self, ServiceError> {
        serde_json::from_value(value)
            .map_err(|e| ServiceError::invalid_input(format!("malformed production entry: {e}")))
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.plan_id.is_none() {
            missing.push("planId");
        }
        if self.production_date.is_none() {
            missing.push("productionDate");
        }
        if self.quantity.is_none() {
            missing.push("quantity");
        }
        missing
    }

    /// Validates a payload for insertion
    pub fn into_entry(self) -> Result<ValidEntry, ServiceError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(ServiceError::invalid_input(format!(
                "planId, productionDate and quantity are required (missing: {})",
                missing.join(", ")
            )));
        }
        self.validate()?;

        match (self.plan_id, self.production_date, self.quantity) {
            (Some(plan_id), Some(production_date), Some(quantity)) => Ok(ValidEntry {
                plan_id,
                production_date,
                quantity,
                shift: normalize(self.shift),
                machine_number: normalize(self.machine_number),
                code: normalize(self.code),
                slip_type: normalize(self.slip_type),
                remarks: normalize(self.remarks),
                operator_name: normalize(self.operator_name),
                in_charge_name: normalize(self.in_charge_name),
            }),
            _ => Err(ServiceError::invalid_input(
                "planId, productionDate and quantity are required",
            )),
        }
    }

    /// Validates a payload for an update, which additionally needs the entry id
    pub fn into_update(self) -> Result<(i32, ValidEntry), ServiceError> {
        let id = self.production_id.ok_or_else(|| {
            ServiceError::invalid_input(
                "productionId, planId, productionDate and quantity are required",
            )
        })?;
        let entry = self.into_entry()?;
        Ok((id, entry))
    }
}

impl ValidEntry {
    pub fn into_active_model(self) -> production::ActiveModel {
        production::ActiveModel {
            plan_id: Set(self.plan_id),
            production_date: Set(self.production_date),
            shift: Set(self.shift),
            machine_number: Set(self.machine_number),
            code: Set(self.code),
            quantity: Set(self.quantity),
            slip_type: Set(self.slip_type),
            remarks: Set(self.remarks),
            operator_name: Set(self.operator_name),
            in_charge_name: Set(self.in_charge_name),
            ..Default::default()
        }
    }

    /// Copies every mutable field onto an existing row
    pub fn apply_to(self, model: production::Model) -> production::ActiveModel {
        let mut active: production::ActiveModel = model.into();
        active.plan_id = Set(self.plan_id);
        active.production_date = Set(self.production_date);
        active.shift = Set(self.shift);
        active.machine_number = Set(self.machine_number);
        active.code = Set(self.code);
        active.quantity = Set(self.quantity);
        active.slip_type = Set(self.slip_type);
        active.remarks = Set(self.remarks);
        active.operator_name = Set(self.operator_name);
        active.in_charge_name = Set(self.in_charge_name);
        active
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `YYYY-MM-DD`, falling back to an RFC 3339 timestamp's calendar date
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| format!("invalid date '{trimmed}', expected YYYY-MM-DD"))
}

pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => parse_date(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Fails with `InvalidInput` naming every id in `plan_ids` that has no plan row.
pub async fn ensure_plans_exist<C, I>(conn: &C, plan_ids: I) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let wanted: BTreeSet<i32> = plan_ids.into_iter().collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = plan::Entity::find()
        .select_only()
        .column(plan::Column::PlanId)
        .filter(plan::Column::PlanId.is_in(wanted.iter().copied()))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    let missing: Vec<String> = wanted
        .difference(&found)
        .map(ToString::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::invalid_input(format!(
            "planId references unknown plan(s): {}",
            missing.join(", ")
        )))
    }
}

/// Maps a tripped `production.plan_id` foreign key to `InvalidInput`; any
/// other failure stays a storage error
pub fn plan_reference_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            ServiceError::invalid_input("planId references an unknown plan")
        }
        _ => ServiceError::db_error(err),
    }
}

/// Fails with `InvalidInput` when `order_id` is set and no such order exists
pub async fn ensure_order_exists<C>(conn: &C, order_id: Option<i32>) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let Some(order_id) = order_id else {
        return Ok(());
    };

    let exists = order_book::Entity::find_by_id(order_id)
        .select_only()
        .column(order_book::Column::OrderId)
        .into_tuple::<i32>()
        .one(conn)
        .await?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(ServiceError::invalid_input(format!(
            "orderId references unknown order: {order_id}"
        )))
    }
}

/// Trims optional text and enforces the column width shared by master data
pub fn clean_text(field: &str, value: Option<String>) -> Result<Option<String>, ServiceError> {
    match normalize(value) {
        Some(v) if v.chars().count() as u64 > MAX_TEXT_LEN => Err(ServiceError::invalid_input(
            format!("{field} must be at most {MAX_TEXT_LEN} characters"),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn non_constraint_errors_stay_storage_failures() {
        let err = plan_reference_error(DbErr::Custom("disk I/O error".into()));
        assert!(err.is_storage_failure());
    }
    use serde_json::json;

    fn complete() -> ProductionEntryPayload {
        ProductionEntryPayload {
            plan_id: Some(3),
            production_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            quantity: Some(5),
            shift: Some("  A ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_payload_is_accepted_and_trimmed() {
        let entry = complete().into_entry().unwrap();
        assert_eq!(entry.plan_id, 3);
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.shift.as_deref(), Some("A"));
        assert_eq!(entry.remarks, None);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let payload = ProductionEntryPayload {
            quantity: Some(0),
            ..complete()
        };
        assert_matches!(payload.into_entry(), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let payload = ProductionEntryPayload {
            quantity: Some(-4),
            ..complete()
        };
        assert_matches!(payload.into_entry(), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn missing_fields_are_named() {
        let payload = ProductionEntryPayload {
            quantity: None,
            production_date: None,
            ..complete()
        };
        match payload.into_entry() {
            Err(ServiceError::InvalidInput(msg)) => {
                assert!(msg.contains("productionDate"));
                assert!(msg.contains("quantity"));
                assert!(!msg.contains("missing: planId"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn update_requires_production_id() {
        assert_matches!(complete().into_update(), Err(ServiceError::InvalidInput(_)));

        let payload = ProductionEntryPayload {
            production_id: Some(11),
            ..complete()
        };
        let (id, entry) = payload.into_update().unwrap();
        assert_eq!(id, 11);
        assert_eq!(entry.plan_id, 3);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let payload = ProductionEntryPayload::from_json(json!({
            "PlanID": 7,
            "ProductionDate": "2024-05-31T18:30:00.000Z",
            "Quantity": 12,
            "Shift": "B",
            "InChargeName": "R. Iyer"
        }))
        .unwrap();

        assert_eq!(payload.plan_id, Some(7));
        assert_eq!(payload.production_date, NaiveDate::from_ymd_opt(2024, 5, 31));
        assert_eq!(payload.quantity, Some(12));
        assert_eq!(payload.in_charge_name.as_deref(), Some("R. Iyer"));
    }

    #[test]
    fn wrongly_typed_fields_are_invalid_input() {
        assert_matches!(
            ProductionEntryPayload::from_json(json!({"planId": "seven", "quantity": 1})),
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            ProductionEntryPayload::from_json(json!({"planId": 1, "productionDate": "31/05/2024"})),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn blank_date_counts_as_missing() {
        let payload =
            ProductionEntryPayload::from_json(json!({"planId": 1, "productionDate": " ", "quantity": 2}))
                .unwrap();
        assert_eq!(payload.production_date, None);
        assert_matches!(payload.into_entry(), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn clean_text_limits_width() {
        assert_eq!(clean_text("model", Some("  ".into())).unwrap(), None);
        assert!(clean_text("model", Some("x".repeat(300))).is_err());
    }
}
