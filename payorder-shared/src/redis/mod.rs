/// Redis integration for the payment job queue
///
/// - `client`: connection management and health checks
/// - `stream_writer`: publishes jobs (XADD with retry)
/// - `stream_reader`: consumer-group reads and acknowledgements
///
/// ```text
/// ┌─────────┐  XADD   ┌──────────────────────┐  XREADGROUP  ┌──────────┐
/// │   API   │ ──────> │ jobs:process_payment │ ───────────> │  Worker  │
/// └─────────┘         └──────────────────────┘ <─── XACK ── └──────────┘
/// ```

pub mod client;
pub mod stream_reader;
pub mod stream_writer;

pub use client::{RedisClient, RedisClientError, RedisConfig, RedisStats};
pub use stream_reader::{ReadPosition, StreamEntry, StreamReader, StreamReaderError};
pub use stream_writer::{StreamWriter, StreamWriterConfig, StreamWriterError};
