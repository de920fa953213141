//! Background payment jobs
//!
//! Creating a payment order enqueues a [`ProcessPaymentJob`]; a worker later
//! consumes it and marks the order paid. The API never waits for the result.
//!
//! ```text
//! API ──publish──> jobs:process_payment ──XREADGROUP──> worker ──> UPDATE payment_orders
//! ```
//!
//! # Example
//!
//! ```
//! use payorder_shared::jobs::{deserialize_job, serialize_job, ProcessPaymentJob};
//! use std::collections::HashMap;
//!
//! let job = ProcessPaymentJob::new(42);
//! let fields: HashMap<String, String> = serialize_job(&job)
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v))
//!     .collect();
//!
//! let decoded = deserialize_job(&fields).unwrap();
//! assert_eq!(decoded.payment_order_id, 42);
//! ```

pub mod publisher;
pub mod serialization;

pub use publisher::{PaymentJobPublisher, PublishError};
pub use serialization::{
    deserialize_job, serialize_job, JobSerializationError, JobStreamConfig, ProcessPaymentJob,
};
