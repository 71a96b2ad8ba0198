//! Transaction helpers.
//!
//! Writes run under READ COMMITTED and multi-query reads under a read-only
//! REPEATABLE READ snapshot on PostgreSQL. SQLite transactions are already
//! serializable and reject isolation hints, so none are sent there.

use crate::errors::ServiceError;
use futures::future::BoxFuture;
use metrics::{counter, histogram};
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    IsolationLevel, TransactionTrait,
};
use std::time::Instant;
use tracing::{debug, error, warn};

/// Opens a transaction for ledger and master-data writes
pub async fn begin_write(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            db.begin_with_config(Some(IsolationLevel::ReadCommitted), None)
                .await
        }
        _ => db.begin().await,
    }
}

/// Opens a read-only transaction whose queries all observe one snapshot
pub async fn begin_snapshot_read(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            db.begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
        }
        _ => db.begin().await,
    }
}

/// Rolls back explicitly. A failed rollback is logged and swallowed so the
/// caller can still surface the error that caused it.
pub async fn rollback_logged(txn: DatabaseTransaction, operation: &str) {
    match txn.rollback().await {
        Ok(()) => {
            counter!("mps_db.transaction.rolled_back", 1, "operation" => operation.to_string());
            debug!(operation, "Transaction rolled back");
        }
        Err(e) => {
            counter!("mps_db.transaction.rollback_failed", 1, "operation" => operation.to_string());
            error!(operation, error = %e, "Transaction rollback failed");
        }
    }
}

/// Runs `f` inside a write transaction: commit on `Ok`, explicit rollback on
/// `Err`. The error returned is always the one produced by `f` (or by the
/// commit itself).
///
/// ```rust,ignore
/// let entry = with_write_transaction(&db, "submit_one", |txn| {
///     Box::pin(async move {
///         ensure_plans_exist(txn, [entry.plan_id]).await?;
///         Ok(entry.into_active_model().insert(txn).await?)
///     })
/// })
/// .await?;
/// ```
pub async fn with_write_transaction<F, T>(
    db: &DatabaseConnection,
    operation: &'static str,
    f: F,
) -> Result<T, ServiceError>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, ServiceError>>,
{
    let start = Instant::now();
    let txn = begin_write(db).await.map_err(|e| {
        error!(operation, error = %e, "Failed to start transaction");
        ServiceError::db_error(e)
    })?;

    let outcome = f(&txn).await;

    let result = match outcome {
        Ok(value) => match txn.commit().await {
            Ok(()) => {
                counter!("mps_db.transaction.committed", 1, "operation" => operation);
                Ok(value)
            }
            Err(e) => {
                error!(operation, error = %e, "Transaction commit failed");
                Err(ServiceError::db_error(e))
            }
        },
        Err(err) => {
            if err.is_storage_failure() {
                warn!(operation, error = %err, "Rolling back after storage failure");
            }
            rollback_logged(txn, operation).await;
            Err(err)
        }
    };

    histogram!("mps_db.transaction.duration", start.elapsed(), "operation" => operation);
    result
}
