//! # PayOrder Worker Library
//!
//! Consumes payment jobs from Redis and marks payment orders paid.
//!
//! ## Modules
//!
//! - `config`: Worker configuration
//! - `orchestrator`: Worker loop and job dispatch
//! - `processor`: Payment processing for a single order
//! - `queue`: Payment job queue consumer

pub mod config;
pub mod orchestrator;
pub mod processor;
pub mod queue;
