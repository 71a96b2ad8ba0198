pub mod transaction;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub use transaction::{begin_snapshot_read, begin_write, rollback_logged, with_write_transaction};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle connections are recycled after this long
    pub idle_timeout: Duration,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns `ServiceError::StorageUnavailable` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("mps_db.max_connections", config.max_connections as f64);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Database connection establishment failed");
        counter!("mps_db.connection_failures", 1);
        ServiceError::db_error(e)
    })?;

    info!(
        backend = ?db_pool.get_database_backend(),
        "Database connection pool established"
    );

    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Creates any missing tables and indexes
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::db_error);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();
    let result = pool.ping().await.map_err(ServiceError::db_error);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database ping succeeded in {:?}", elapsed);
            histogram!("mps_db.ping.duration", elapsed);
        }
        Err(e) => {
            error!("Database ping failed after {:?}: {}", elapsed, e);
            counter!("mps_db.connection_failures", 1);
        }
    }

    result
}

/// Pings the pool on a fixed interval so idle links stay warm.
///
/// Returns `None` when `interval` is zero. Failures are logged and retried on
/// the next tick.
pub fn spawn_keepalive(pool: Arc<DbPool>, interval: Duration) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Database keep-alive disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match check_connection(&pool).await {
                Ok(()) => debug!("Database keep-alive ping ok"),
                Err(e) => warn!(error = %e, "Database keep-alive ping failed"),
            }
        }
    }))
}
