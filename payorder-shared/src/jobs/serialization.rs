/// Payment job messages and their Redis Stream encoding
///
/// A stream entry is a flat list of string field/value pairs, so a job is
/// written as:
///
/// ```text
/// jobs:process_payment
///   1735732800000-0:
///     payment_order_id: "42"
///     enqueued_at: "2025-01-01T12:00:00+00:00"
/// ```
///
/// The stream key and consumer group name come from [`JobStreamConfig`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default stream that carries payment jobs
pub const DEFAULT_PAYMENT_JOBS_STREAM: &str = "jobs:process_payment";

/// Default consumer group the workers join
pub const DEFAULT_PAYMENT_JOBS_GROUP: &str = "payment-processors";

const FIELD_PAYMENT_ORDER_ID: &str = "payment_order_id";
const FIELD_ENQUEUED_AT: &str = "enqueued_at";

/// Job encoding errors
#[derive(Error, Debug, PartialEq)]
pub enum JobSerializationError {
    /// Required field absent from the stream entry
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but unparseable
    #[error("Invalid field value for {field}: {error}")]
    InvalidValue { field: &'static str, error: String },
}

/// Instruction to mark one payment order paid
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessPaymentJob {
    pub payment_order_id: i64,
    pub enqueued_at: DateTime<Utc>,
}

impl ProcessPaymentJob {
    /// Creates a job stamped with the current time
    pub fn new(payment_order_id: i64) -> Self {
        Self {
            payment_order_id,
            enqueued_at: Utc::now(),
        }
    }
}

/// Encodes a job as stream field/value pairs, ready for XADD
pub fn serialize_job(job: &ProcessPaymentJob) -> Vec<(&'static str, String)> {
    vec![
        (FIELD_PAYMENT_ORDER_ID, job.payment_order_id.to_string()),
        (FIELD_ENQUEUED_AT, job.enqueued_at.to_rfc3339()),
    ]
}

/// Decodes a job from a stream entry's fields
///
/// `enqueued_at` is optional so that entries added by hand
/// (`XADD jobs:process_payment * payment_order_id 7`) are still processed.
pub fn deserialize_job(
    fields: &HashMap<String, String>,
) -> Result<ProcessPaymentJob, JobSerializationError> {
    let raw_id = fields
        .get(FIELD_PAYMENT_ORDER_ID)
        .ok_or(JobSerializationError::MissingField(FIELD_PAYMENT_ORDER_ID))?;

    let payment_order_id =
        raw_id
            .trim()
            .parse::<i64>()
            .map_err(|e| JobSerializationError::InvalidValue {
                field: FIELD_PAYMENT_ORDER_ID,
                error: e.to_string(),
            })?;

    let enqueued_at = match fields.get(FIELD_ENQUEUED_AT) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| JobSerializationError::InvalidValue {
                field: FIELD_ENQUEUED_AT,
                error: e.to_string(),
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    Ok(ProcessPaymentJob {
        payment_order_id,
        enqueued_at,
    })
}

/// Where payment jobs are published and consumed
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobStreamConfig {
    /// Redis Stream key
    pub stream_key: String,

    /// Consumer group shared by all workers
    pub consumer_group: String,
}

impl Default for JobStreamConfig {
    fn default() -> Self {
        Self {
            stream_key: DEFAULT_PAYMENT_JOBS_STREAM.to_string(),
            consumer_group: DEFAULT_PAYMENT_JOBS_GROUP.to_string(),
        }
    }
}

impl JobStreamConfig {
    /// Reads `PAYMENT_JOBS_STREAM` and `PAYMENT_JOBS_GROUP`, falling back to
    /// the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            stream_key: env::var("PAYMENT_JOBS_STREAM").unwrap_or(defaults.stream_key),
            consumer_group: env::var("PAYMENT_JOBS_GROUP").unwrap_or(defaults.consumer_group),
        }
    }
}
