/// Payment job queue consumer
///
/// Wraps a consumer-group [`StreamReader`] and turns stream entries into
/// [`ClaimedJob`]s for the orchestrator.
///
/// # Delivery
///
/// - On the first claims after startup the queue walks this consumer's
///   pending list, so jobs a previous run received but never acknowledged
///   are retried. Once that list is exhausted it switches to new entries.
/// - A job is acknowledged only after it reaches a terminal outcome. Jobs
///   that fail on an infrastructure error stay pending until the next restart.
/// - Entries that do not decode into a job are logged and acknowledged right
///   away; retrying them cannot help.
///
/// # Connections
///
/// A blocking read holds its connection for up to `block_ms`. After
/// [`PaymentQueue::use_dedicated_reader`], reads for new entries run on their
/// own connection so acknowledgements from running jobs are not queued
/// behind them.
///
/// # Example
///
/// ```no_run
/// use payorder_shared::jobs::JobStreamConfig;
/// use payorder_shared::redis::{RedisClient, RedisConfig};
/// use payorder_worker::queue::PaymentQueue;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let redis = RedisClient::new(RedisConfig::from_env()?).await?;
/// let mut queue = PaymentQueue::new(redis, &JobStreamConfig::default(), "worker-1");
/// queue.ensure_group().await?;
///
/// for claimed in queue.claim_jobs(10).await? {
///     println!("Order {}", claimed.job.payment_order_id);
///     queue.ack(&claimed.stream_id).await?;
/// }
/// # Ok(())
/// # }
/// ```

use payorder_shared::jobs::{deserialize_job, JobStreamConfig, ProcessPaymentJob};
use payorder_shared::redis::{
    ReadPosition, RedisClient, RedisClientError, StreamEntry, StreamReader, StreamReaderError,
};
use thiserror::Error;

/// Job queue error
#[derive(Debug, Error)]
pub enum QueueError {
    /// Redis error
    #[error("Queue error: {0}")]
    Stream(#[from] StreamReaderError),

    #[error("Queue connection error: {0}")]
    Connection(#[from] RedisClientError),
}

/// A decoded job together with the stream entry that carried it
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedJob {
    /// Stream entry ID, needed to acknowledge the job
    pub stream_id: String,

    pub job: ProcessPaymentJob,
}

/// Consumer side of the payment job stream
#[derive(Clone)]
pub struct PaymentQueue {
    redis: RedisClient,

    /// Group setup, pending reads and acks
    control: StreamReader,

    /// Blocking reads for new entries
    reader: StreamReader,

    /// This worker's name within the consumer group
    consumer: String,

    /// How long a read for new entries may block
    block_ms: usize,

    /// Last pending entry handed out; `None` once the pending list is drained
    pending_cursor: Option<String>,
}

impl PaymentQueue {
    pub fn new(redis: RedisClient, jobs: &JobStreamConfig, consumer: impl Into<String>) -> Self {
        let control =
            StreamReader::new(redis.clone(), jobs.stream_key.clone(), jobs.consumer_group.clone());

        PaymentQueue {
            redis,
            reader: control.clone(),
            control,
            consumer: consumer.into(),
            block_ms: 5000,
            pending_cursor: Some("0".to_string()),
        }
    }

    /// Sets how long a read for new entries may block
    pub fn with_block_ms(mut self, block_ms: usize) -> Self {
        self.block_ms = block_ms;
        self
    }

    /// Moves blocking reads onto a connection of their own
    pub async fn use_dedicated_reader(&mut self) -> Result<(), QueueError> {
        let connection = self.redis.connect_dedicated().await?;
        self.reader = StreamReader::new(
            connection,
            self.control.stream_key().to_string(),
            self.control.group().to_string(),
        );
        Ok(())
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// Creates the consumer group if it does not exist yet
    pub async fn ensure_group(&self) -> Result<(), QueueError> {
        self.control.ensure_group().await?;
        Ok(())
    }

    /// Claims up to `limit` jobs
    ///
    /// Returns pending jobs from a previous run first, then new ones. An empty
    /// result means nothing arrived within the block timeout.
    pub async fn claim_jobs(&mut self, limit: usize) -> Result<Vec<ClaimedJob>, QueueError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let entries = match self.pending_cursor.clone() {
            Some(after) => {
                let entries = self
                    .control
                    .read_group(&self.consumer, ReadPosition::Pending { after: &after }, limit, None)
                    .await?;

                match entries.last() {
                    Some(last) => {
                        tracing::info!(
                            consumer = %self.consumer,
                            count = entries.len(),
                            "Recovered pending payment jobs"
                        );
                        self.pending_cursor = Some(last.id.clone());
                        entries
                    }
                    None => {
                        self.pending_cursor = None;
                        self.read_new(limit).await?
                    }
                }
            }
            None => self.read_new(limit).await?,
        };

        let mut claimed = Vec::with_capacity(entries.len());

        for entry in entries {
            match decode_entry(&entry) {
                Some(job) => claimed.push(ClaimedJob {
                    stream_id: entry.id,
                    job,
                }),
                None => {
                    self.ack(&entry.id).await?;
                }
            }
        }

        Ok(claimed)
    }

    async fn read_new(&self, limit: usize) -> Result<Vec<StreamEntry>, QueueError> {
        let entries = self
            .reader
            .read_group(&self.consumer, ReadPosition::New, limit, Some(self.block_ms))
            .await?;
        Ok(entries)
    }

    /// Acknowledges a job so it is never delivered again
    pub async fn ack(&self, stream_id: &str) -> Result<(), QueueError> {
        self.control.ack(&[stream_id]).await?;
        Ok(())
    }
}

/// Decodes an entry, logging the ones that cannot be processed
fn decode_entry(entry: &StreamEntry) -> Option<ProcessPaymentJob> {
    match deserialize_job(&entry.fields) {
        Ok(job) => Some(job),
        Err(e) => {
            tracing::warn!(
                stream_id = %entry.id,
                error = %e,
                "Discarding malformed payment job"
            );
            None
        }
    }
}
