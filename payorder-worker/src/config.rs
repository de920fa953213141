/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`: see `payorder_shared::db`
/// - `REDIS_URL` and `REDIS_*`: see `payorder_shared::redis`
/// - `PAYMENT_JOBS_STREAM`, `PAYMENT_JOBS_GROUP`: stream and consumer group
/// - `WORKER_CONSUMER_NAME`: name within the group (default: `$HOSTNAME`,
///   else `payment-worker`)
/// - `WORKER_MAX_CONCURRENT_JOBS`: default 10
/// - `WORKER_BATCH_SIZE`: default 10
/// - `WORKER_BLOCK_MS`: default 5000
/// - `WORKER_SHUTDOWN_TIMEOUT_SECS`: default 30

use crate::orchestrator::{OrchestratorConfig, DEFAULT_CONSUMER_NAME};
use payorder_shared::db::DatabaseConfig;
use payorder_shared::jobs::JobStreamConfig;
use payorder_shared::redis::RedisConfig;
use std::env;
use std::str::FromStr;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub orchestrator: OrchestratorConfig,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is
    /// invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig::from_env()?;
        let redis = RedisConfig::from_env()?;
        let defaults = OrchestratorConfig::default();

        let consumer_name = env::var("WORKER_CONSUMER_NAME")
            .or_else(|_| env::var("HOSTNAME"))
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CONSUMER_NAME.to_string());

        let max_concurrent_jobs =
            parse_env("WORKER_MAX_CONCURRENT_JOBS", defaults.max_concurrent_jobs)?;
        if max_concurrent_jobs == 0 {
            anyhow::bail!("WORKER_MAX_CONCURRENT_JOBS must be at least 1");
        }

        let batch_size = parse_env("WORKER_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            anyhow::bail!("WORKER_BATCH_SIZE must be at least 1");
        }

        Ok(Self {
            database,
            redis,
            orchestrator: OrchestratorConfig {
                jobs: JobStreamConfig::from_env(),
                consumer_name,
                max_concurrent_jobs,
                batch_size,
                block_ms: parse_env("WORKER_BLOCK_MS", defaults.block_ms)?,
                shutdown_timeout_secs: parse_env(
                    "WORKER_SHUTDOWN_TIMEOUT_SECS",
                    defaults.shutdown_timeout_secs,
                )?,
                error_backoff_ms: defaults.error_backoff_ms,
            },
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: usize = parse_env("PAYORDER_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("PAYORDER_TEST_GARBAGE_VARIABLE", "ten");
        let result: anyhow::Result<usize> = parse_env("PAYORDER_TEST_GARBAGE_VARIABLE", 1);
        assert!(result.unwrap_err().to_string().contains("PAYORDER_TEST_GARBAGE_VARIABLE"));
    }
}
