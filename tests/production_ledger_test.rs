mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{entry_json, TestApp};
use mps_api::{
    db::begin_snapshot_read,
    entities::production,
    errors::ServiceError,
    services::{
        consistency::ProductionEntryPayload,
        production_ledger::{ProductionDataFilter, ProductionLedgerService, BULK_INSERT_CHUNK},
        StatusAggregatorService,
    },
};
use rstest::rstest;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

fn payload(value: Value) -> ProductionEntryPayload {
    ProductionEntryPayload::from_json(value).expect("well-formed payload")
}

async fn produced_for(app: &TestApp, plan_id: i32) -> i64 {
    app.state
        .services
        .status
        .plan_statuses()
        .await
        .expect("plan statuses")
        .into_iter()
        .find(|s| s.plan_id == plan_id)
        .map(|s| s.production)
        .expect("plan present in status view")
}

async fn ledger_len(app: &TestApp) -> usize {
    app.state.services.ledger.list(None).await.unwrap().len()
}

#[rstest]
#[case::zero_quantity(json!({"planId": 1, "productionDate": "2024-06-03", "quantity": 0}))]
#[case::negative_quantity(json!({"planId": 1, "productionDate": "2024-06-03", "quantity": -4}))]
#[case::missing_plan(json!({"productionDate": "2024-06-03", "quantity": 5}))]
#[case::missing_date(json!({"planId": 1, "quantity": 5}))]
#[tokio::test]
async fn invalid_single_entry_is_rejected_without_writing(#[case] body: Value) {
    let app = TestApp::new().await;
    app.seed_plan(100, None, "Active").await;

    let err = app
        .state
        .services
        .ledger
        .submit_one(payload(body))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
    assert_eq!(ledger_len(&app).await, 0);
}

#[tokio::test]
async fn submitted_entry_is_visible_to_plan_status_immediately() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;

    let created = app
        .state
        .services
        .ledger
        .submit_one(payload(entry_json(plan.plan_id, 5)))
        .await
        .unwrap();

    assert!(created.production_id > 0);
    assert_eq!(created.quantity, 5);
    assert_eq!(created.shift.as_deref(), Some("A"));
    assert_eq!(produced_for(&app, plan.plan_id).await, 5);
}

#[tokio::test]
async fn entry_for_unknown_plan_is_invalid_input() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .ledger
        .submit_one(payload(entry_json(404, 5)))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(msg) if msg.contains("404"));
}

#[tokio::test]
async fn empty_bulk_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .ledger
        .submit_bulk(Vec::new())
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
    assert_eq!(ledger_len(&app).await, 0);
}

#[tokio::test]
async fn bulk_with_one_incomplete_entry_writes_nothing() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;

    let err = app
        .state
        .services
        .ledger
        .submit_bulk(vec![
            payload(entry_json(plan.plan_id, 10)),
            payload(json!({"planId": plan.plan_id, "productionDate": "2024-06-03"})),
        ])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(msg) if msg.starts_with("entry 1"));
    assert_eq!(ledger_len(&app).await, 0);
    assert_eq!(produced_for(&app, plan.plan_id).await, 0);
}

#[tokio::test]
async fn bulk_with_dangling_plan_rolls_back_entirely() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;

    let err = app
        .state
        .services
        .ledger
        .submit_bulk(vec![
            payload(entry_json(plan.plan_id, 10)),
            payload(entry_json(9_999, 10)),
        ])
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
    assert_eq!(ledger_len(&app).await, 0);
}

#[tokio::test]
async fn large_bulk_spans_several_insert_statements() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(1_000, None, "Active").await;

    let batch: Vec<_> = (1..=120)
        .map(|i| payload(entry_json(plan.plan_id, i % 7 + 1)))
        .collect();
    let expected: i64 = (1..=120).map(|i| i64::from(i % 7 + 1)).sum();

    let summary = app.state.services.ledger.submit_bulk(batch).await.unwrap();

    assert_eq!(summary.inserted, 120);
    assert_eq!(ledger_len(&app).await, 120);
    assert_eq!(produced_for(&app, plan.plan_id).await, expected);
}

#[tokio::test]
async fn concurrent_bulk_writes_on_disjoint_plans_lose_nothing() {
    let app = TestApp::new().await;
    let mut plans = Vec::new();
    for _ in 0..4 {
        plans.push(app.seed_plan(500, None, "Active").await.plan_id);
    }

    let handles: Vec<_> = plans
        .iter()
        .map(|&plan_id| {
            let ledger = app.state.services.ledger.clone();
            tokio::spawn(async move {
                let batch = (0..25).map(|_| payload(entry_json(plan_id, 2))).collect();
                ledger.submit_bulk(batch).await
            })
        })
        .collect();

    for handle in handles {
        let summary = handle.await.expect("task joined").expect("bulk succeeded");
        assert_eq!(summary.inserted, 25);
    }

    for plan_id in plans {
        assert_eq!(produced_for(&app, plan_id).await, 50);
    }
}

/// Retries a bulk that lost a SQLite lock race; a failed attempt leaves no rows.
async fn submit_bulk_until_accepted(ledger: &ProductionLedgerService, plan_id: i32) -> usize {
    for _ in 0..50 {
        let batch = (0..25).map(|_| payload(entry_json(plan_id, 2))).collect();
        match ledger.submit_bulk(batch).await {
            Ok(summary) => return summary.inserted,
            Err(e) if e.is_storage_failure() => {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            Err(e) => panic!("bulk rejected: {e}"),
        }
    }
    panic!("bulk for plan {plan_id} never acquired the write lock");
}

#[tokio::test]
async fn overlapping_transactions_on_a_shared_pool_lose_nothing() {
    let app = TestApp::with_pool_size(4).await;
    let mut plans = Vec::new();
    for _ in 0..3 {
        plans.push(app.seed_plan(500, None, "Active").await.plan_id);
    }

    // held open on its own connection for the whole run
    let reader = begin_snapshot_read(&app.state.db).await.unwrap();
    assert_eq!(production::Entity::find().count(&reader).await.unwrap(), 0);

    let handles: Vec<_> = plans
        .iter()
        .map(|&plan_id| {
            let ledger = app.state.services.ledger.clone();
            tokio::spawn(async move { submit_bulk_until_accepted(&ledger, plan_id).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.expect("task joined"), 25);
    }

    // the open snapshot still sees the pre-batch ledger
    assert_eq!(production::Entity::find().count(&reader).await.unwrap(), 0);
    reader.commit().await.unwrap();

    assert_eq!(ledger_len(&app).await, 75);
    for plan_id in plans {
        assert_eq!(produced_for(&app, plan_id).await, 50);
    }
}

#[tokio::test]
async fn storage_failure_in_a_later_chunk_rolls_back_earlier_chunks() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(10_000, None, "Active").await;
    app.state
        .db
        .execute_unprepared(
            "CREATE TRIGGER reject_sentinel_quantity BEFORE INSERT ON production \
             WHEN NEW.quantity = 999 BEGIN SELECT RAISE(ABORT, 'sentinel quantity'); END",
        )
        .await
        .unwrap();

    let failing_index = BULK_INSERT_CHUNK + 5;
    let batch = (0..BULK_INSERT_CHUNK + 10)
        .map(|i| {
            let quantity = if i == failing_index { 999 } else { 3 };
            payload(entry_json(plan.plan_id, quantity))
        })
        .collect();

    let err = app
        .state
        .services
        .ledger
        .submit_bulk(batch)
        .await
        .unwrap_err();

    assert!(err.is_storage_failure(), "unexpected error: {err}");
    assert_eq!(ledger_len(&app).await, 0);
    assert_eq!(produced_for(&app, plan.plan_id).await, 0);

    // the only pooled connection came back without a dangling transaction
    app.state
        .services
        .ledger
        .submit_one(payload(entry_json(plan.plan_id, 4)))
        .await
        .unwrap();
    assert_eq!(produced_for(&app, plan.plan_id).await, 4);
}

#[tokio::test]
async fn foreign_key_violation_is_reported_as_invalid_input() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;
    // removes the plan after the existence check has passed
    app.state
        .db
        .execute_unprepared(
            "CREATE TRIGGER drop_plan_under_entry BEFORE INSERT ON production \
             WHEN NEW.quantity = 998 BEGIN DELETE FROM plan_table WHERE plan_id = NEW.plan_id; END",
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .ledger
        .submit_one(payload(entry_json(plan.plan_id, 998)))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(msg) if msg.contains("planId"));
    assert_eq!(ledger_len(&app).await, 0);
    // the trigger's delete was rolled back with the entry
    assert_eq!(produced_for(&app, plan.plan_id).await, 0);
}

#[tokio::test]
async fn update_replaces_fields_and_reports_missing_rows() {
    let app = TestApp::new().await;
    let first = app.seed_plan(100, None, "Active").await;
    let second = app.seed_plan(100, None, "Active").await;
    let ledger = &app.state.services.ledger;

    let entry = ledger
        .submit_one(payload(entry_json(first.plan_id, 5)))
        .await
        .unwrap();

    let updated = ledger
        .update(payload(json!({
            "productionId": entry.production_id,
            "planId": second.plan_id,
            "productionDate": "2024-06-04",
            "quantity": 8,
            "shift": "B"
        })))
        .await
        .unwrap();

    assert_eq!(updated.plan_id, second.plan_id);
    assert_eq!(updated.quantity, 8);
    assert_eq!(updated.shift.as_deref(), Some("B"));
    assert_eq!(updated.operator_name, None);
    assert_eq!(produced_for(&app, first.plan_id).await, 0);
    assert_eq!(produced_for(&app, second.plan_id).await, 8);

    let missing = ledger
        .update(payload(json!({
            "productionId": 77_777,
            "planId": first.plan_id,
            "productionDate": "2024-06-04",
            "quantity": 1
        })))
        .await
        .unwrap_err();
    assert_matches!(missing, ServiceError::NotFound(_));

    let without_id = ledger
        .update(payload(entry_json(first.plan_id, 1)))
        .await
        .unwrap_err();
    assert_matches!(without_id, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn update_many_skips_bad_elements_and_applies_the_rest() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;
    let ledger = &app.state.services.ledger;

    let a = ledger
        .submit_one(payload(entry_json(plan.plan_id, 5)))
        .await
        .unwrap();
    let b = ledger
        .submit_one(payload(entry_json(plan.plan_id, 5)))
        .await
        .unwrap();

    let summary = ledger
        .update_many(vec![
            json!({"productionId": a.production_id, "planId": plan.plan_id,
                   "productionDate": "2024-06-05", "quantity": 20}),
            json!({"productionId": b.production_id, "planId": plan.plan_id,
                   "productionDate": "2024-06-05"}),
            json!({"productionId": 55_555, "planId": plan.plan_id,
                   "productionDate": "2024-06-05", "quantity": 3}),
            json!("not an entry"),
            json!({"productionId": b.production_id, "planId": 8_888,
                   "productionDate": "2024-06-05", "quantity": 3}),
        ])
        .await
        .unwrap();

    assert_eq!(summary.updated, 1);
    let skipped: Vec<usize> = summary.skipped.iter().map(|s| s.index).collect();
    assert_eq!(skipped, vec![1, 2, 3, 4]);
    assert_eq!(produced_for(&app, plan.plan_id).await, 25);
}

#[tokio::test]
async fn update_many_rejects_empty_batch() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .ledger
        .update_many(Vec::new())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn deleting_missing_entry_leaves_aggregation_intact() {
    let app = TestApp::new().await;
    let order = app.seed_order(50).await;
    let plan = app.seed_plan(50, Some(order.order_id), "Active").await;
    let ledger = &app.state.services.ledger;

    let entry = ledger
        .submit_one(payload(entry_json(plan.plan_id, 20)))
        .await
        .unwrap();

    assert_matches!(
        ledger.delete(entry.production_id + 1_000).await,
        Err(ServiceError::NotFound(_))
    );
    assert_eq!(produced_for(&app, plan.plan_id).await, 20);

    ledger.delete(entry.production_id).await.unwrap();

    let orders = app.state.services.status.order_statuses().await.unwrap();
    let status = orders
        .iter()
        .find(|o| o.order_id == order.order_id)
        .expect("order listed");
    assert_eq!(status.production, 0);
    assert_eq!(status.pending_quantity, 50);
    // the plan itself is untouched
    assert_eq!(app.state.services.plans.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_can_be_narrowed_to_one_entry() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;
    let ledger = &app.state.services.ledger;

    let first = ledger
        .submit_one(payload(entry_json(plan.plan_id, 1)))
        .await
        .unwrap();
    ledger
        .submit_one(payload(entry_json(plan.plan_id, 2)))
        .await
        .unwrap();

    let only = ledger.list(Some(first.production_id)).await.unwrap();
    assert_eq!(only, vec![first]);
    assert_eq!(ledger.list(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn production_details_join_plan_and_filter() {
    let app = TestApp::new().await;
    let plan = app.seed_plan(100, None, "Active").await;
    let ledger = &app.state.services.ledger;

    ledger
        .submit_one(payload(entry_json(plan.plan_id, 4)))
        .await
        .unwrap();
    ledger
        .submit_one(payload(json!({
            "planId": plan.plan_id,
            "productionDate": "2024-06-04",
            "shift": "B",
            "quantity": 6
        })))
        .await
        .unwrap();

    let all = ledger
        .production_details(ProductionDataFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|row| row.unit.as_deref() == Some("U1")));

    let shift_b = ledger
        .production_details(ProductionDataFilter {
            shift: Some("B".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(shift_b.len(), 1);
    assert_eq!(shift_b[0].quantity, 6);

    let other_unit = ledger
        .production_details(ProductionDataFilter {
            unit: Some("U9".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(other_unit.is_empty());
}

#[tokio::test]
async fn unreachable_storage_surfaces_as_storage_unavailable() {
    let db = Arc::new(DatabaseConnection::Disconnected);
    let ledger = ProductionLedgerService::new(db.clone());
    let status = StatusAggregatorService::new(db);

    let err = ledger
        .submit_bulk(vec![payload(entry_json(1, 1))])
        .await
        .unwrap_err();
    assert!(err.is_storage_failure());

    assert!(status.plan_statuses().await.unwrap_err().is_storage_failure());
    assert!(status.order_statuses().await.unwrap_err().is_storage_failure());
}
