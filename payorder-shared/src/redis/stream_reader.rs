/// Redis Stream reader for consumer groups
///
/// Workers share a consumer group on the payment stream, so each job is
/// delivered to exactly one of them. A delivered entry stays in the group's
/// pending list until it is acknowledged; a worker that restarts can re-read
/// its own unacknowledged entries with [`ReadPosition::Pending`].
///
/// ```text
/// jobs:process_payment
///     │
///     ├──> XGROUP CREATE ... MKSTREAM         (ensure_group, idempotent)
///     ├──> XREADGROUP ... STREAMS key 0       (own pending entries)
///     ├──> XREADGROUP ... BLOCK n STREAMS key >  (new entries)
///     └──> XACK key group id...               (ack)
/// ```
///
/// Blocking reads hold the connection for up to `block_ms`, and commands
/// queued behind them on the same connection wait that long too.

use crate::redis::client::{RedisClient, RedisClientError};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use thiserror::Error;

/// Stream reader errors
#[derive(Error, Debug)]
pub enum StreamReaderError {
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisClientError),

    #[error("Redis command error: {0}")]
    RedisCommandError(#[from] redis::RedisError),
}

/// Which part of the stream a group read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPosition<'a> {
    /// Entries delivered to this consumer but never acknowledged, with IDs
    /// greater than `after` (`"0"` for all of them)
    Pending { after: &'a str },

    /// Entries never delivered to any consumer in the group (`>`)
    New,
}

impl ReadPosition<'static> {
    /// Every pending entry
    pub const ALL_PENDING: Self = ReadPosition::Pending { after: "0" };
}

impl ReadPosition<'_> {
    fn as_id(&self) -> &str {
        match self {
            ReadPosition::Pending { after } => *after,
            ReadPosition::New => ">",
        }
    }
}

/// One stream entry with its fields decoded to strings
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    /// Stream entry ID (`{millis}-{seq}`)
    pub id: String,

    /// Field/value pairs; empty if the entry was trimmed while pending
    pub fields: HashMap<String, String>,
}

/// Reader bound to one stream and one consumer group
#[derive(Clone)]
pub struct StreamReader {
    client: RedisClient,
    stream_key: String,
    group: String,
}

impl StreamReader {
    pub fn new(client: RedisClient, stream_key: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            client,
            stream_key: stream_key.into(),
            group: group.into(),
        }
    }

    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Creates the consumer group (and the stream) if missing
    ///
    /// A new group starts at the beginning of the stream so jobs published
    /// before the first worker came up are still delivered.
    pub async fn ensure_group(&self) -> Result<(), StreamReaderError> {
        let mut conn = self.client.get_connection();

        let result: Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(&self.stream_key, &self.group, "0")
            .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    stream_key = %self.stream_key,
                    group = %self.group,
                    "Consumer group created"
                );
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => {
                tracing::debug!(
                    stream_key = %self.stream_key,
                    group = %self.group,
                    "Consumer group already exists"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads up to `count` entries for `consumer`
    ///
    /// `block_ms` only applies to [`ReadPosition::New`]; pending reads return
    /// immediately. An empty vector means nothing arrived in time.
    pub async fn read_group(
        &self,
        consumer: &str,
        position: ReadPosition<'_>,
        count: usize,
        block_ms: Option<usize>,
    ) -> Result<Vec<StreamEntry>, StreamReaderError> {
        let mut conn = self.client.get_connection();

        let mut options = StreamReadOptions::default()
            .group(&self.group, consumer)
            .count(count);

        if position == ReadPosition::New {
            if let Some(ms) = block_ms {
                options = options.block(ms);
            }
        }

        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.stream_key], &[position.as_id()], &options)
            .await?;

        let mut entries = Vec::new();

        for key in reply.map(|r| r.keys).unwrap_or_default() {
            for stream_id in key.ids {
                let fields = stream_id
                    .map
                    .iter()
                    .filter_map(|(field, value)| {
                        redis::from_redis_value::<String>(value)
                            .ok()
                            .map(|v| (field.clone(), v))
                    })
                    .collect();

                entries.push(StreamEntry {
                    id: stream_id.id,
                    fields,
                });
            }
        }

        Ok(entries)
    }

    /// Acknowledges entries so they leave the pending list
    ///
    /// Returns how many were acknowledged.
    pub async fn ack(&self, ids: &[&str]) -> Result<usize, StreamReaderError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.client.get_connection();
        let acked: usize = conn.xack(&self.stream_key, &self.group, ids).await?;

        tracing::debug!(stream_key = %self.stream_key, acked, "Acknowledged stream entries");
        Ok(acked)
    }

    /// Number of entries currently in the stream
    pub async fn len(&self) -> Result<usize, StreamReaderError> {
        let mut conn = self.client.get_connection();
        let len: usize = conn.xlen(&self.stream_key).await?;
        Ok(len)
    }
}
