#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Append-only, idempotent persistence of trade lifecycle rows.
//!
//! `write_close` is the one operation the rest of the core leans on for its
//! idempotence law (spec.md L2): replaying it with the same `trade_id` after
//! a crash or a duplicate confirmation must be a no-op, never a double
//! counted realized P&L.

pub mod error;
pub mod in_memory;
pub mod record;
pub mod redis_journal;

pub use error::JournalError;
pub use in_memory::InMemoryTradeJournal;
pub use record::{Mode, TradeClose, TradeRecord};
pub use redis_journal::RedisTradeJournal;

use async_trait::async_trait;

#[async_trait]
pub trait TradeJournal: Send + Sync {
    async fn write_open(&self, record: TradeRecord) -> Result<(), JournalError>;

    /// Idempotent by `trade_id`: a replay with identical arguments after the
    /// row is already closed MUST be a no-op.
    async fn write_close(&self, trade_id: &str, close: TradeClose) -> Result<(), JournalError>;

    async fn read(&self, trade_id: &str) -> Result<Option<TradeRecord>, JournalError>;
}
