//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JUDGE0_TIMEOUT_SECS, DEFAULT_MOUNT_PATH,
    DEFAULT_POLL_INITIAL_DELAY_MS, DEFAULT_POLL_MAX_RETRIES, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub judge0: Judge0Config,
    pub problems: ProblemsConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// JWT verification configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// Judge0 (remote execution service) configuration
#[derive(Debug, Clone)]
pub struct Judge0Config {
    /// Base URI, e.g. `https://judge0-ce.p.rapidapi.com`
    pub uri: String,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: Option<String>,
    /// Where Judge0 should PUT each finished test case
    pub callback_url: Option<String>,
    pub timeout: Duration,
}

/// Problem content configuration
#[derive(Debug, Clone)]
pub struct ProblemsConfig {
    pub mount_path: PathBuf,
}

/// Polling client settings; not part of the server's [`Config`]
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub initial_delay: Duration,
    pub max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            judge0: Judge0Config::from_env()?,
            problems: ProblemsConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: required_var("DATABASE_URL")?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required_var("JWT_SECRET")?,
        })
    }
}

impl Judge0Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            uri: required_var("JUDGE0_URI")?.trim_end_matches('/').to_string(),
            rapidapi_key: optional_var("X_RAPIDAPI_KEY"),
            rapidapi_host: optional_var("X_RAPIDAPI_HOST"),
            callback_url: optional_var("JUDGE0_CALLBACK_URL"),
            timeout: Duration::from_secs(parse_var(
                "JUDGE0_TIMEOUT_SECS",
                DEFAULT_JUDGE0_TIMEOUT_SECS,
            )?),
        })
    }
}

impl ProblemsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            mount_path: PathBuf::from(
                env::var("MOUNT_PATH").unwrap_or_else(|_| DEFAULT_MOUNT_PATH.to_string()),
            ),
        })
    }
}

impl PollingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            initial_delay: Duration::from_millis(parse_var(
                "POLL_INITIAL_DELAY_MS",
                DEFAULT_POLL_INITIAL_DELAY_MS,
            )?),
            max_retries: parse_var("POLL_MAX_RETRIES", DEFAULT_POLL_MAX_RETRIES)?,
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name.to_string()))
}

/// Unset and empty variables are both treated as absent.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr + ToString>(name: &str, default: T) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
