use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};

use mps_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    let db_arc = Arc::new(db_pool);
    let keepalive = api::db::spawn_keepalive(
        db_arc.clone(),
        Duration::from_secs(cfg.db_keepalive_interval_secs),
    );

    let app_state = api::AppState::new(db_arc.clone(), cfg.clone());
    let app = api::app_router(app_state)?;

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!(environment = %cfg.environment, "mps-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = keepalive {
        handle.abort();
    }
    if let Err(e) = (*db_arc).clone().close().await {
        warn!(error = %e, "Database pool did not close cleanly");
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
