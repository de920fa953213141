/// Redis Stream writer for payment jobs
///
/// Appends jobs to the payment stream with XADD, retrying with exponential
/// backoff when Redis is briefly unreachable.
///
/// ```text
/// API (create_payment_order)
///     │
///     │ publish(job)
///     ▼
/// StreamWriter ──XADD──> jobs:process_payment ──> worker consumer group
/// ```
///
/// # Example
///
/// ```no_run
/// use payorder_shared::jobs::{PaymentJobPublisher, ProcessPaymentJob};
/// use payorder_shared::redis::{RedisClient, RedisConfig, StreamWriter};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::from_env()?).await?;
/// let writer = StreamWriter::new(client, "jobs:process_payment");
///
/// let stream_id = writer.publish(&ProcessPaymentJob::new(42)).await?;
/// println!("Enqueued as {}", stream_id);
/// # Ok(())
/// # }
/// ```

use crate::jobs::{serialize_job, PaymentJobPublisher, ProcessPaymentJob, PublishError};
use crate::redis::client::RedisClient;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use thiserror::Error;

/// Stream writer errors
#[derive(Error, Debug)]
pub enum StreamWriterError {
    /// Write failed after retries
    #[error("Failed to write to {stream_key} after {attempts} attempts: {last_error}")]
    WriteFailed {
        stream_key: String,
        attempts: u32,
        last_error: String,
    },
}

impl From<StreamWriterError> for PublishError {
    fn from(err: StreamWriterError) -> Self {
        match err {
            StreamWriterError::WriteFailed {
                attempts,
                last_error,
                ..
            } => PublishError::Unavailable {
                attempts,
                last_error,
            },
        }
    }
}

/// Retry behaviour for XADD
#[derive(Debug, Clone)]
pub struct StreamWriterConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubles each time
    pub base_retry_delay_ms: u64,

    /// Upper bound on any single delay
    pub max_retry_delay_ms: u64,
}

impl Default for StreamWriterConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

impl StreamWriterConfig {
    /// Backoff before retry number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay_ms = self
            .base_retry_delay_ms
            .saturating_mul(factor)
            .min(self.max_retry_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Publishes payment jobs to a single Redis Stream
#[derive(Clone)]
pub struct StreamWriter {
    client: RedisClient,
    stream_key: String,
    config: StreamWriterConfig,
}

impl StreamWriter {
    /// Writer for `stream_key`, retrying as often as the client's
    /// `max_retries` allows
    pub fn new(client: RedisClient, stream_key: impl Into<String>) -> Self {
        let config = StreamWriterConfig {
            max_retries: client.config().max_retries,
            ..Default::default()
        };

        Self {
            client,
            stream_key: stream_key.into(),
            config,
        }
    }

    pub fn with_config(
        client: RedisClient,
        stream_key: impl Into<String>,
        config: StreamWriterConfig,
    ) -> Self {
        Self {
            client,
            stream_key: stream_key.into(),
            config,
        }
    }

    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    /// Appends one job to the stream
    ///
    /// # Returns
    ///
    /// The stream entry ID (`{millis}-{seq}`)
    pub async fn publish_job(&self, job: &ProcessPaymentJob) -> Result<String, StreamWriterError> {
        let fields = serialize_job(job);
        let stream_id = self.xadd_with_retry(&fields).await?;

        tracing::debug!(
            payment_order_id = job.payment_order_id,
            stream_key = %self.stream_key,
            stream_id = %stream_id,
            "Published payment job"
        );

        Ok(stream_id)
    }

    async fn xadd_with_retry(
        &self,
        fields: &[(&'static str, String)],
    ) -> Result<String, StreamWriterError> {
        let items: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let mut attempt = 0;

        loop {
            let mut conn = self.client.get_connection();

            match conn.xadd::<_, _, _, _, String>(&self.stream_key, "*", &items).await {
                Ok(stream_id) => return Ok(stream_id),
                Err(e) => {
                    attempt += 1;

                    if attempt > self.config.max_retries {
                        return Err(StreamWriterError::WriteFailed {
                            stream_key: self.stream_key.clone(),
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = self.config.retry_delay(attempt);
                    tracing::warn!(
                        stream_key = %self.stream_key,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "XADD failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl PaymentJobPublisher for StreamWriter {
    async fn publish(&self, job: &ProcessPaymentJob) -> Result<String, PublishError> {
        Ok(self.publish_job(job).await?)
    }

    async fn is_healthy(&self) -> bool {
        self.client.ping().await.unwrap_or(false)
    }
}
