//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8000)
//! - `APP_MODE` - `debug` or `release` (default: release)
//! - `DATABASE_MAX_CONNECTIONS` - Pool upper bound (default: 25)
//! - `DATABASE_MIN_CONNECTIONS` - Warm connections kept open (default: 5)
//! - `DATABASE_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)
//! - `RATE_LIMIT_PER_MINUTE` - Requests per client per minute on `/api` (default: 100)
//! - `TRUST_PROXY_HEADERS` - Key the throttle on `X-Forwarded-For`/`X-Real-IP` (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Runtime mode switch.
///
/// Only affects ambient behaviour (default log verbosity, Sentry
/// environment tag), never request semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    Debug,
    #[default]
    Release,
}

impl AppMode {
    /// Name reported to Sentry and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub const fn default_log_filter(self) -> &'static str {
        match self {
            Self::Debug => "rollcall_api=debug,tower_http=debug",
            Self::Release => "rollcall_api=info,tower_http=info",
        }
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(format!("expected 'debug' or 'release', got '{other}'")),
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Connection pool configuration
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Runtime mode
    pub mode: AppMode,
    /// Requests admitted per client per one-minute window on `/api`
    pub rate_limit_per_minute: u32,
    /// Whether proxy headers identify the client for throttling
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// `PostgreSQL` connection pool configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (contains password)
    pub url: SecretString,
    /// Maximum open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let database = DatabaseConfig::from_env(&env)?;
        let host = env.parsed_or("HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = env.parsed_or("PORT", 8000_u16)?;
        let mode = env.parsed_or("APP_MODE", AppMode::default())?;
        let rate_limit_per_minute = env.parsed_or("RATE_LIMIT_PER_MINUTE", 100_u32)?;
        if rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_PER_MINUTE".to_owned(),
                "must be at least 1".to_owned(),
            ));
        }
        let trust_proxy_headers = env.parsed_or("TRUST_PROXY_HEADERS", false)?;
        let sentry_dsn = env.optional("SENTRY_DSN");

        Ok(Self {
            database,
            host,
            port,
            mode,
            rate_limit_per_minute,
            trust_proxy_headers,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let url = SecretString::from(env.required("DATABASE_URL")?);
        let max_connections = env.parsed_or("DATABASE_MAX_CONNECTIONS", 25_u32)?;
        let min_connections = env.parsed_or("DATABASE_MIN_CONNECTIONS", 5_u32)?;
        let acquire_timeout_secs = env.parsed_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "DATABASE_MAX_CONNECTIONS".to_owned(),
                "must be at least 1".to_owned(),
            ));
        }
        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "DATABASE_MIN_CONNECTIONS".to_owned(),
                format!("must not exceed DATABASE_MAX_CONNECTIONS ({max_connections})"),
            ));
        }

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Thin wrapper over a variable lookup function.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
        })
    }
}
