use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_UPLOAD_DIR: &str = "public/Uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_JWT_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;
const MIN_JWT_SECRET_LEN: usize = 32;
const DEV_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// WhatsApp webhook configuration. The notifier stays disabled unless both the
/// endpoint and the API key are provided.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Webhook endpoint accepting `{ to, message }`
    #[serde(default)]
    pub api_url: Option<String>,

    /// Bearer credential for the webhook
    #[serde(default)]
    pub api_key: Option<String>,

    /// Phone number that receives new-booking alerts
    #[serde(default)]
    pub recipient: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_whatsapp_timeout_secs")]
    pub timeout_secs: u64,

    /// Delivery attempts before giving up
    #[serde(default = "default_whatsapp_max_retries")]
    #[validate(range(min = 1, max = 10))]
    pub max_retries: u32,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            recipient: None,
            timeout_secs: default_whatsapp_timeout_secs(),
            max_retries: default_whatsapp_max_retries(),
        }
    }
}

impl WhatsAppConfig {
    pub fn is_enabled(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
        present(&self.api_url) && present(&self.api_key)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (mysql:// in production, sqlite:// for local runs)
    #[validate(length(min = 1))]
    pub database_url: String,

    /// JWT signing secret; see [`AppConfig::resolve_jwt_secret`]
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_jwt_expiration_secs")]
    #[validate(range(min = 60))]
    pub jwt_expiration_secs: u64,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Public origin prefixed to stored media paths, e.g. `https://api.cityhomeservice.in`
    #[serde(default)]
    pub base_url: String,

    /// Directory receiving uploaded images
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Upload size cap in bytes
    #[serde(default = "default_max_upload_bytes")]
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
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

    /// Outbound WhatsApp notifications
    #[serde(default)]
    #[validate]
    pub whatsapp: WhatsAppConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration_secs(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            base_url: String::new(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            whatsapp: WhatsAppConfig::default(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    fn allows_ephemeral_secret(&self) -> bool {
        self.is_development() || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Origins accepted by the CORS layer. Development always admits the local
    /// frontend dev servers.
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self
            .cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.trim_end_matches('/').to_string())
            .collect();

        if self.is_development() {
            for origin in DEV_CORS_ORIGINS {
                if !origins.iter().any(|o| o == origin) {
                    origins.push((*origin).to_string());
                }
            }
        }
        origins
    }

    /// Returns the configured signing secret. Outside development and test an
    /// absent secret is a startup error; in those environments a random one is
    /// generated and every issued token dies with the process.
    pub fn resolve_jwt_secret(&self) -> Result<String, AppConfigError> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if self.allows_ephemeral_secret() => {
                warn!(
                    "jwt_secret is not configured; generating an ephemeral secret. \
                     Tokens will not survive a restart."
                );
                Ok(crate::auth::generate_secret(64))
            }
            _ => Err(AppConfigError::MissingSecret),
        }
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(secret) = self.jwt_secret.as_deref() {
            if !secret.trim().is_empty() && secret.trim().len() < MIN_JWT_SECRET_LEN {
                let mut err = ValidationError::new("jwt_secret_too_short");
                err.message = Some(
                    format!("jwt_secret must be at least {MIN_JWT_SECRET_LEN} characters").into(),
                );
                errors.add("jwt_secret", err);
            }
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_pool_bounds");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("jwt_secret is required outside development; set APP__JWT_SECRET or JWT_SECRET")]
    MissingSecret,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_jwt_expiration_secs() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
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
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_whatsapp_timeout_secs() -> u64 {
    10
}

fn default_whatsapp_max_retries() -> u32 {
    3
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("city_home_service={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Plain console logging at the default level, for failures that happen
/// before a configuration is available
pub fn init_fallback_tracing() {
    init_tracing(DEFAULT_LOG_LEVEL, false);
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*), plus the bare `DATABASE_URL`,
///    `JWT_SECRET` and `PORT` variables used by the hosting platform
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
        .set_default("database_url", "sqlite://city_home_service.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    for (var, key) in [
        ("DATABASE_URL", "database_url"),
        ("JWT_SECRET", "jwt_secret"),
        ("PORT", "port"),
    ] {
        let already_set = env::var(format!("APP__{}", var)).is_ok();
        if let (false, Ok(value)) = (already_set, env::var(var)) {
            builder = builder.set_override(key, value)?;
        }
    }

    let app_config: AppConfig = builder.build()?.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(environment: &str) -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            environment.into(),
        )
    }

    #[test]
    fn production_requires_jwt_secret() {
        let cfg = base_config("production");
        assert!(matches!(
            cfg.resolve_jwt_secret(),
            Err(AppConfigError::MissingSecret)
        ));
    }

    #[test]
    fn development_generates_ephemeral_secret() {
        let cfg = base_config("development");
        let first = cfg.resolve_jwt_secret().unwrap();
        let second = cfg.resolve_jwt_secret().unwrap();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }

    #[test]
    fn configured_secret_is_used_verbatim() {
        let mut cfg = base_config("production");
        cfg.jwt_secret = Some("a-production-secret-that-is-long-enough-123".into());
        assert_eq!(
            cfg.resolve_jwt_secret().unwrap(),
            "a-production-secret-that-is-long-enough-123"
        );
    }

    #[test]
    fn short_secret_fails_validation() {
        let mut cfg = base_config("production");
        cfg.jwt_secret = Some("short".into());
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn development_adds_local_cors_origins() {
        let mut cfg = base_config("development");
        cfg.cors_allowed_origins = Some("https://cityhomeservice.in/, ".into());
        let origins = cfg.cors_origins();
        assert_eq!(origins[0], "https://cityhomeservice.in");
        assert!(origins.iter().any(|o| o == "http://localhost:3000"));
    }

    #[test]
    fn production_cors_is_exactly_configured_list() {
        let mut cfg = base_config("production");
        cfg.cors_allowed_origins =
            Some("https://cityhomeservice.in,https://admin.cityhomeservice.in".into());
        assert_eq!(
            cfg.cors_origins(),
            vec![
                "https://cityhomeservice.in".to_string(),
                "https://admin.cityhomeservice.in".to_string()
            ]
        );
    }

    #[test]
    fn whatsapp_disabled_without_credentials() {
        let mut wa = WhatsAppConfig::default();
        assert!(!wa.is_enabled());
        wa.api_url = Some("https://hooks.example.com/send".into());
        assert!(!wa.is_enabled());
        wa.api_key = Some("key".into());
        assert!(wa.is_enabled());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = base_config("development");
        cfg.log_level = "loud".into();
        assert!(cfg.validate().is_err());
    }
}
