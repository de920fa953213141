/// Worker orchestrator
///
/// Main worker loop: claims payment jobs from the queue and runs each one in
/// its own Tokio task, at most `max_concurrent_jobs` at a time.
///
/// # Architecture
///
/// ```text
/// Orchestrator
///   ├─> PaymentQueue: claim pending, then new jobs (XREADGROUP)
///   ├─> process_payment: mark the order paid
///   └─> PaymentQueue: acknowledge (XACK) once an outcome is reached
/// ```
///
/// # Shutdown
///
/// Cancelling the [`CancellationToken`] from [`WorkerOrchestrator::shutdown_token`]
/// stops claiming. Jobs already running finish, bounded by
/// `shutdown_timeout_secs`.
///
/// # Example
///
/// ```no_run
/// use payorder_shared::redis::{RedisClient, RedisConfig};
/// use payorder_worker::orchestrator::WorkerOrchestrator;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let redis_client = RedisClient::new(RedisConfig::from_env()?).await?;
///
/// let orchestrator = WorkerOrchestrator::new(pool, redis_client);
/// let shutdown = orchestrator.shutdown_token();
///
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// orchestrator.run().await?;
/// # Ok(())
/// # }
/// ```

use crate::processor::process_payment;
use crate::queue::{ClaimedJob, PaymentQueue};
use payorder_shared::jobs::JobStreamConfig;
use payorder_shared::redis::RedisClient;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;

/// Default consumer name when none is configured
pub const DEFAULT_CONSUMER_NAME: &str = "payment-worker";

/// Worker orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Stream and consumer group to read from
    pub jobs: JobStreamConfig,

    /// Name of this worker within the consumer group; must be stable across
    /// restarts for pending jobs to be recovered
    pub consumer_name: String,

    /// Maximum jobs running at once
    pub max_concurrent_jobs: usize,

    /// Maximum jobs claimed per read
    pub batch_size: usize,

    /// How long one read waits for new jobs
    pub block_ms: usize,

    /// How long shutdown waits for running jobs
    pub shutdown_timeout_secs: u64,

    /// Pause after a failed read before trying again
    pub error_backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            jobs: JobStreamConfig::default(),
            consumer_name: DEFAULT_CONSUMER_NAME.to_string(),
            max_concurrent_jobs: 10,
            batch_size: 10,
            block_ms: 5000,
            shutdown_timeout_secs: 30,
            error_backoff_ms: 1000,
        }
    }
}

/// Worker orchestrator
pub struct WorkerOrchestrator {
    db: PgPool,

    queue: PaymentQueue,

    config: OrchestratorConfig,

    shutdown_token: CancellationToken,
}

impl WorkerOrchestrator {
    /// Creates an orchestrator with the default configuration
    pub fn new(db: PgPool, redis: RedisClient) -> Self {
        Self::with_config(db, redis, OrchestratorConfig::default())
    }

    /// Creates an orchestrator with custom configuration
    pub fn with_config(db: PgPool, redis: RedisClient, config: OrchestratorConfig) -> Self {
        let queue = PaymentQueue::new(redis, &config.jobs, config.consumer_name.clone())
            .with_block_ms(config.block_ms);

        WorkerOrchestrator {
            db,
            queue,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the worker loop until the shutdown token is cancelled
    ///
    /// # Errors
    ///
    /// Fails only if the consumer group or the reader connection cannot be
    /// set up at startup. Errors while reading are logged and retried.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.queue.ensure_group().await?;
        self.queue.use_dedicated_reader().await?;

        tracing::info!(
            stream_key = %self.config.jobs.stream_key,
            group = %self.config.jobs.consumer_group,
            consumer = %self.config.consumer_name,
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "Worker orchestrator starting"
        );

        let max_jobs = self.config.max_concurrent_jobs.max(1);
        let slots = Arc::new(Semaphore::new(max_jobs));

        loop {
            // Wait for a free slot before claiming anything
            let first_permit = tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                permit = slots.clone().acquire_owned() => permit?,
            };

            let limit = (slots.available_permits() + 1).min(self.config.batch_size.max(1));

            // Dropping an in-flight read can strand delivered entries in the
            // pending list; they are picked up again on the next start.
            let claimed = tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                result = self.queue.claim_jobs(limit) => result,
            };

            let jobs = match claimed {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim payment jobs");
                    drop(first_permit);
                    tokio::select! {
                        _ = self.shutdown_token.cancelled() => break,
                        _ = sleep(Duration::from_millis(self.config.error_backoff_ms)) => {}
                    }
                    continue;
                }
            };

            let mut permit = Some(first_permit);
            for claimed in jobs {
                let permit = match permit.take() {
                    Some(permit) => permit,
                    None => slots.clone().acquire_owned().await?,
                };
                self.dispatch(claimed, permit);
            }
        }

        tracing::info!("Shutdown requested, waiting for running jobs to complete");

        let drained = timeout(
            Duration::from_secs(self.config.shutdown_timeout_secs),
            slots.acquire_many(max_jobs as u32),
        )
        .await;

        match drained {
            Ok(_) => tracing::info!("Worker orchestrator shut down"),
            Err(_) => tracing::warn!(
                running = max_jobs - slots.available_permits(),
                "Force shutdown with jobs still running"
            ),
        }

        Ok(())
    }

    /// Spawns one job; the permit is held until it finishes
    fn dispatch(&self, claimed: ClaimedJob, permit: OwnedSemaphorePermit) {
        let db = self.db.clone();
        let queue = self.queue.clone();

        tokio::spawn(async move {
            execute_job(&db, &queue, claimed).await;
            drop(permit);
        });
    }
}

/// Runs one job and acknowledges it once it has an outcome
async fn execute_job(db: &PgPool, queue: &PaymentQueue, claimed: ClaimedJob) {
    let payment_order_id = claimed.job.payment_order_id;

    match process_payment(db, payment_order_id).await {
        Ok(_) => {
            if let Err(e) = queue.ack(&claimed.stream_id).await {
                tracing::error!(
                    payment_order_id,
                    stream_id = %claimed.stream_id,
                    error = %e,
                    "Failed to acknowledge payment job"
                );
            }
        }
        Err(e) => {
            tracing::error!(
                payment_order_id,
                stream_id = %claimed.stream_id,
                error = %e,
                "Payment processing failed, leaving job pending"
            );
        }
    }
}
