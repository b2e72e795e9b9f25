/// TaskHub Web - Configuration management.
///
/// Loads configuration from TOML files with multi-environment support.
///
/// Loading order:
/// 1. config/default.toml - default values
/// 2. config/{environment}.toml - environment-specific values
/// 3. config/local.toml - local overrides (not versioned, ignored when testing)
/// 4. TASKHUB_SECRET_KEY and TASKHUB_DATABASE_URL environment variables
///
/// Configuration directory lookup order:
/// 1. TASKHUB_CONFIG_DIR environment variable (if set)
/// 2. Workspace root config/ directory
/// 3. /etc/taskhub/
use config::{Config as ConfigBuilder, ConfigError, File};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// Generate a Debug implementation that prints `[REDACTED]` for secret fields.
#[macro_export]
macro_rules! debug_redacted_struct {
    (
        $name:ident,
        redact: [$($redact:ident),*],
        show: [$($show:ident),*]
    ) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($show), &self.$show))*
                    $(.field(stringify!($redact), &"[REDACTED]"))*
                    .finish()
            }
        }
    };
}

/// Application environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "testing" | "test" => Self::Testing,
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }
}

/// Application configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub secret_key: secrecy::SecretString,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub websocket: WebSocketConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

debug_redacted_struct!(
    Config,
    redact: [secret_key],
    show: [environment, server, database, jwt, websocket, jobs, logging]
);

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which store implementation backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

/// Database configuration.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    pub url: secrecy::SecretString,
    pub max_connections: usize,
}

debug_redacted_struct!(
    DatabaseConfig,
    redact: [url],
    show: [backend, max_connections]
);

/// JWT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub access_token_lifetime_minutes: u64,
}

/// Live notification connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// Outbound queue size per connection.
    pub channel_capacity: usize,
    pub ping_interval_secs: u64,
}

/// Scheduled sweep job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub enabled: bool,
    pub due_check_interval_secs: u64,
    pub daily_summary_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    pub due_soon_window_hours: i64,
    pub task_retention_days: i64,
}

impl JobsConfig {
    pub fn due_soon_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.due_soon_window_hours)
    }

    pub fn task_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.task_retention_days)
    }

    pub fn due_check_interval(&self) -> Duration {
        Duration::from_secs(self.due_check_interval_secs)
    }

    pub fn daily_summary_interval(&self) -> Duration {
        Duration::from_secs(self.daily_summary_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl LogFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from the discovered config directory, selecting the
    /// environment from `TASKHUB_ENVIRONMENT`.
    pub fn load() -> Result<Self, AppError> {
        let config_path = Self::find_config_dir()?;
        let environment = std::env::var("TASKHUB_ENVIRONMENT")
            .map(|e| Environment::parse(&e))
            .unwrap_or_default();
        Self::load_with_environment(config_path, environment)
    }

    fn find_config_dir() -> Result<PathBuf, AppError> {
        if let Ok(path) = std::env::var("TASKHUB_CONFIG_DIR") {
            let config_path = PathBuf::from(&path);
            if config_path.exists() {
                return Ok(config_path);
            }
            return Err(AppError::Config(format!(
                "TASKHUB_CONFIG_DIR points to non-existent directory: {}",
                path
            )));
        }

        // CARGO_MANIFEST_DIR is taskhub-web/, config/ lives one level up.
        let workspace_config = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .map(|p| p.join("config"));
        if let Some(ref config_path) = workspace_config
            && config_path.exists()
        {
            return Ok(config_path.clone());
        }

        let system_config = Path::new("/etc/taskhub");
        if system_config.exists() {
            return Ok(system_config.to_path_buf());
        }

        Err(AppError::Config(
            "Configuration directory not found. Searched:\n\
             - TASKHUB_CONFIG_DIR environment variable\n\
             - Workspace root config/ directory\n\
             - /etc/taskhub/"
                .to_string(),
        ))
    }

    /// Load configuration with a specific environment.
    pub fn load_with_environment<P: AsRef<Path>>(
        config_path: P,
        environment: Environment,
    ) -> Result<Self, AppError> {
        let config_path = config_path.as_ref();

        let default_path = config_path.join("default.toml");
        if !default_path.exists() {
            return Err(AppError::Config(format!(
                "Configuration file not found: {}",
                default_path.display()
            )));
        }
        let mut builder = ConfigBuilder::builder().add_source(File::from(default_path));

        let env_path = config_path.join(format!("{}.toml", environment.as_str()));
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path));
        }

        if environment != Environment::Testing {
            let local_path = config_path.join("local.toml");
            if local_path.exists() {
                builder = builder.add_source(File::from(local_path));
            }
        }

        for (key, var) in [
            ("secret_key", "TASKHUB_SECRET_KEY"),
            ("database.url", "TASKHUB_DATABASE_URL"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder
                    .set_override(key, value)
                    .map_err(Self::config_error)?;
            }
        }

        let settings = builder.build().map_err(Self::config_error)?;
        let mut config: Config = settings.try_deserialize().map_err(Self::config_error)?;
        config.environment = environment;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a base TOML string plus an overlay.
    pub fn from_toml_with_overlay(base_toml: &str, overlay_toml: &str) -> Result<Self, AppError> {
        let settings = ConfigBuilder::builder()
            .add_source(File::from_str(base_toml, config::FileFormat::Toml))
            .add_source(File::from_str(overlay_toml, config::FileFormat::Toml))
            .build()
            .map_err(Self::config_error)?;

        let config: Config = settings.try_deserialize().map_err(Self::config_error)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.secret_key.expose_secret().is_empty() {
            return Err(AppError::Config(
                "secret_key is required. Set it in config/{environment}.toml, config/local.toml, \
                 or via the TASKHUB_SECRET_KEY environment variable."
                    .to_string(),
            ));
        }
        if self.websocket.channel_capacity == 0 {
            return Err(AppError::Config(
                "websocket.channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.websocket.ping_interval_secs == 0 {
            return Err(AppError::Config(
                "websocket.ping_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.jobs.enabled
            && [
                self.jobs.due_check_interval_secs,
                self.jobs.daily_summary_interval_secs,
                self.jobs.cleanup_interval_secs,
            ]
            .contains(&0)
        {
            return Err(AppError::Config(
                "jobs intervals must be greater than zero when jobs are enabled".to_string(),
            ));
        }
        Ok(())
    }

    fn config_error(e: ConfigError) -> AppError {
        AppError::Config(format!("Configuration error: {}", e))
    }
}
