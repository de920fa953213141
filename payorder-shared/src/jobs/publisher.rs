/// Producer side of the payment job queue
///
/// The API only needs "put this job somewhere a worker will find it", so it
/// depends on this trait rather than on Redis directly. The production
/// implementation is [`crate::redis::StreamWriter`].

use super::serialization::ProcessPaymentJob;
use async_trait::async_trait;
use thiserror::Error;

/// Publishing failed
#[derive(Error, Debug)]
pub enum PublishError {
    /// The queue could not be reached, even after retrying
    #[error("Job queue unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

/// Enqueues payment jobs without waiting for them to run
#[async_trait]
pub trait PaymentJobPublisher: Send + Sync {
    /// Publishes a job and returns the queue's ID for the entry
    async fn publish(&self, job: &ProcessPaymentJob) -> Result<String, PublishError>;

    /// Whether the queue is reachable right now; used by health checks
    async fn is_healthy(&self) -> bool {
        true
    }
}
