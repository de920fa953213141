//! Database layer: connection pooling and schema migrations
//!
//! Models live in [`crate::models`].

pub mod migrations;
pub mod pool;

pub use pool::{create_pool, DatabaseConfig};
