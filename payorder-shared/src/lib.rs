//! # PayOrder Shared Library
//!
//! Types and data access shared by the PayOrder API server and the payment
//! worker.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: users and payment orders
//! - `jobs`: the payment job payload and the publisher seam
//! - `redis`: Redis client and stream reader/writer

pub mod db;
pub mod jobs;
pub mod models;
pub mod redis;

/// Current version of the PayOrder shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
