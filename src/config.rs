use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://mps.db?mode=rwc";
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_JWT_SECRET: &str =
    "mps_development_only_secret_key_replace_before_deploying_anywhere_v1";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (postgres:// or sqlite://)
    pub database_url: String,

    /// JWT secret key (minimum 64 characters)
    #[validate(length(min = 64), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    #[validate(range(min = 60, max = 86400))]
    pub jwt_expiration: u64,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to create the schema on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Interval between liveness pings on the pool, 0 disables
    #[serde(default = "default_db_keepalive_interval_secs")]
    pub db_keepalive_interval_secs: u64,

    /// JWT issuer name
    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    /// JWT audience
    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_size")]
    #[validate(range(min = 1024))]
    pub max_body_size: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration: default_jwt_expiration(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_keepalive_interval_secs: default_db_keepalive_interval_secs(),
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
            max_body_size: default_max_body_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development. Set APP__JWT_SECRET to a unique value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_jwt_expiration() -> u64 {
    3600
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    0
}
fn default_db_connect_timeout_secs() -> u64 {
    15
}
fn default_db_idle_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    10
}
fn default_db_keepalive_interval_secs() -> u64 {
    60
}

fn default_auth_issuer() -> String {
    "mps-api".to_string()
}

fn default_auth_audience() -> String {
    "mps-clients".to_string()
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < 64 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be at least 64 characters".into());
        return Err(err);
    }

    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some("JWT secret cannot be a repeated character sequence".into());
            return Err(err);
        }
    }

    let lower = trimmed.to_ascii_lowercase();
    let weak_fragments = ["changeme", "your_secret_key", "password", "12345678"];
    if weak_fragments.iter().any(|pattern| lower.contains(pattern)) {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret appears to be weak; use a random string".into());
        return Err(err);
    }

    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must have at least 10 unique characters".into());
        return Err(err);
    }

    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("mps_api={},tower_http=debug,sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("jwt_expiration", default_jwt_expiration() as i64)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    // jwt_secret only has a default in development
    if run_env.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }

    let config = builder
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET (minimum 64 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET.".into(),
        )));
    }

    let mut app_config: AppConfig = config.try_deserialize()?;
    app_config.log_level = app_config.log_level.to_ascii_lowercase();

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str =
        "k3V9qLr7TzX2mWc8NpB4sYh6JdF1gRa5UeQ0vKt9LxZ3nMb7PwC2yHj6SdG4fTq8";

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite://mps.db?mode=memory".into(),
            TEST_SECRET.into(),
            "127.0.0.1".into(),
            8080,
            "production".into(),
        )
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_allows_override_flag() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn non_dev_with_origins_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://planner.example.com".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn development_allows_permissive_by_default() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn dev_secret_rejected_in_production() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("jwt_secret"));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        cfg.db_min_connections = 20;
        cfg.db_max_connections = 10;
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("db_min_connections"));
    }

    #[test]
    fn defaults_match_pool_contract() {
        let cfg = base_config();
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.db_idle_timeout_secs, 30);
        assert_eq!(cfg.db_keepalive_interval_secs, 60);
        assert_eq!(cfg.jwt_expiration, 3600);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn weak_secrets_fail_validation() {
        assert!(validate_jwt_secret(&"a".repeat(80)).is_err());
        assert!(validate_jwt_secret("short").is_err());
        assert!(validate_jwt_secret(&format!("{}password", TEST_SECRET)).is_err());
        assert!(validate_jwt_secret(TEST_SECRET).is_ok());
        assert!(validate_jwt_secret(DEV_DEFAULT_JWT_SECRET).is_ok());
    }

    #[test]
    fn log_level_validation() {
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
