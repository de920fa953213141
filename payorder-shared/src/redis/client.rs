/// Redis client wrapper
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own, and
/// adds configuration from the environment plus a PING health check with a
/// timeout. Cloning the client is cheap and shares the underlying connection.
///
/// # Example
///
/// ```no_run
/// use payorder_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis health check failed: {0}")]
    HealthCheckFailed(String),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => {
                RedisClientError::ConnectionError(format!("IO error: {}", err))
            }
            redis::ErrorKind::ResponseError => {
                RedisClientError::CommandError(format!("Response error: {}", err))
            }
            _ => RedisClientError::CommandError(err.to_string()),
        }
    }
}

/// Redis connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// `redis://[username:password@]host:port[/db]`
    pub url: String,

    /// Seconds to wait for the initial connection
    pub connection_timeout_secs: u64,

    /// Seconds to wait for a single command
    pub command_timeout_secs: u64,

    /// Retries for publish operations
    pub max_retries: u32,
}

impl RedisConfig {
    /// Settings for `url` with default timeouts
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout_secs: 5,
            command_timeout_secs: 10,
            max_retries: 3,
        }
    }

    /// Loads settings from the environment
    ///
    /// # Environment Variables
    ///
    /// - `REDIS_URL`: connection URL (required)
    /// - `REDIS_CONNECTION_TIMEOUT_SECS`: default 5
    /// - `REDIS_COMMAND_TIMEOUT_SECS`: default 10
    /// - `REDIS_MAX_RETRIES`: default 3
    pub fn from_env() -> Result<Self, RedisClientError> {
        dotenvy::dotenv().ok();

        let url = env::var("REDIS_URL").map_err(|_| {
            RedisClientError::ConfigError("REDIS_URL environment variable is required".to_string())
        })?;

        let mut config = Self::with_url(url);

        if let Some(secs) = parse_env("REDIS_CONNECTION_TIMEOUT_SECS") {
            config.connection_timeout_secs = secs;
        }
        if let Some(secs) = parse_env("REDIS_COMMAND_TIMEOUT_SECS") {
            config.command_timeout_secs = secs;
        }
        if let Some(retries) = parse_env("REDIS_MAX_RETRIES") {
            config.max_retries = retries;
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Shared Redis connection with health checking
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Fails if the URL is malformed or the server cannot be reached within
    /// `connection_timeout_secs`.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout_secs),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            RedisClientError::ConnectionError(format!(
                "Timed out after {}s connecting to Redis",
                config.connection_timeout_secs
            ))
        })?
        .map_err(|e| {
            RedisClientError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        tracing::info!(url = %sanitize_url(&config.url), "Redis client connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Sends PING; `Ok(true)` on PONG
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.manager.clone();

        let result: Result<String, RedisError> = tokio::time::timeout(
            Duration::from_secs(self.config.command_timeout_secs),
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| RedisClientError::HealthCheckFailed("PING command timed out".to_string()))?;

        match result {
            Ok(pong) if pong == "PONG" => Ok(true),
            Ok(other) => {
                tracing::warn!(response = %other, "Unexpected PING response");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, "Redis health check failed");
                Err(RedisClientError::HealthCheckFailed(e.to_string()))
            }
        }
    }

    /// Handle for issuing commands; reconnects transparently
    /// Opens a second, independent connection with the same configuration
    ///
    /// Clones of a `RedisClient` share one multiplexed connection. Blocking
    /// commands such as `XREADGROUP ... BLOCK` should get their own.
    pub async fn connect_dedicated(&self) -> Result<Self, RedisClientError> {
        Self::new((*self.config).clone()).await
    }

    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    pub async fn stats(&self) -> RedisStats {
        let healthy = self.ping().await.unwrap_or(false);

        RedisStats {
            healthy,
            url: sanitize_url(&self.config.url),
        }
    }
}

/// Connection summary safe to log or expose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStats {
    pub healthy: bool,

    /// URL with credentials masked
    pub url: String,
}

/// Masks `user:password` in a Redis URL
fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end + 3];
            let host = &url[at_pos + 1..];
            return format!("{}***:***@{}", scheme, host);
        }
    }
    url.to_string()
}
