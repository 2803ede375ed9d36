use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_PAGE_SIZE: u64 = 50;
const DEFAULT_MAX_PAGE_SIZE: u64 = 1000;
const DEFAULT_IMPORT_BATCH_SIZE: usize = 1000;
const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_JWT_EXPIRATION_SECS: u64 = 1800;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT signing secret (minimum 32 characters)
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
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
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Default number of items returned by list endpoints
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound for the `limit` query parameter
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Number of validated rows persisted per bulk insert during imports
    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
}

impl AppConfig {
    /// Convenience constructor used mainly by tests; remaining knobs take
    /// their built-in defaults.
    pub fn new(
        database_url: impl Into<String>,
        jwt_secret: impl Into<String>,
        jwt_expiration: u64,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration,
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            import_batch_size: default_import_batch_size(),
            max_upload_size: default_max_upload_size(),
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development") || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_jwt_expiration() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u64 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_import_batch_size() -> usize {
    DEFAULT_IMPORT_BATCH_SIZE
}

fn default_max_upload_size() -> usize {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

/// Initializes the tracing subscriber for the whole process.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("inventario_api={},tower_http=info", level);
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::new(filter))
            .with(fmt::layer())
            .init();
    }
}

/// Loads configuration from built-in defaults, an optional `config/{env}.toml`
/// profile, and `APP__*` environment variables (highest precedence).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    // NOTE: jwt_secret has no default - it MUST be provided via environment
    // variable or config file. This prevents accidental use of insecure
    // defaults in production.
    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://inventario.db?mode=rwc")?
        .set_default("jwt_expiration", DEFAULT_JWT_EXPIRATION_SECS as i64)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    let profile = format!("{CONFIG_DIR}/{run_env}");
    if Path::new(&format!("{profile}.toml")).exists() {
        builder = builder.add_source(File::with_name(&profile));
    }

    let cfg: AppConfig = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()?;

    Ok(cfg)
}
