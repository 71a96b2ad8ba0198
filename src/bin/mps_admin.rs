use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mps_api::{
    auth::{AuthConfig, AuthService},
    config, db,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "mps-admin", about = "Schema and user administration for mps-api", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create any missing tables and indexes
    Migrate,
    /// Add a login to the users table
    CreateUser {
        #[arg(long)]
        username: String,
        /// Falls back to the MPS_ADMIN_PASSWORD environment variable
        #[arg(long, env = "MPS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool)
                .await
                .context("failed running migrations")?;
            println!("Schema is up to date");
        }
        Commands::CreateUser { username, password } => {
            let pool = Arc::new(pool);
            let service = AuthService::new(AuthConfig::from(&cfg), pool);
            let user = service
                .create_user(&username, &password)
                .await
                .with_context(|| format!("failed to create user '{username}'"))?;
            info!(user_id = user.id, "User created");
            println!("Created user {} (id {})", user.username, user.id);
        }
    }

    Ok(())
}
