use crate::error::JournalError;
use crate::record::{TradeClose, TradeRecord};
use crate::TradeJournal;
use async_trait::async_trait;
use redis::Commands;
use tracing::debug;

fn row_key(trade_id: &str) -> String {
    format!("indexbot:trade:{trade_id}")
}

/// Redis-backed journal. Every call borrows a fresh synchronous connection
/// off the engine loop thread via [`tokio::task::spawn_blocking`] - the
/// `redis` crate's blocking [`Commands`] API is simpler to reason about for
/// a single-writer-per-row workload than juggling a multiplexed async
/// connection, and it keeps this crate's dependency footprint aligned with
/// the rest of the workspace.
pub struct RedisTradeJournal {
    client: redis::Client,
}

impl std::fmt::Debug for RedisTradeJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTradeJournal").finish_non_exhaustive()
    }
}

impl RedisTradeJournal {
    pub fn open(redis_url: &str) -> Result<Self, JournalError> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    fn get_row(conn: &mut redis::Connection, trade_id: &str) -> Result<Option<TradeRecord>, JournalError> {
        let raw: Option<String> = conn.get(row_key(trade_id))?;
        raw.map(|json| serde_json::from_str(&json).map_err(JournalError::from))
            .transpose()
    }
}

#[async_trait]
impl TradeJournal for RedisTradeJournal {
    async fn write_open(&self, record: TradeRecord) -> Result<(), JournalError> {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = client.get_connection()?;
            let json = serde_json::to_string(&record)?;
            let _: () = conn.set(row_key(&record.trade_id), json)?;
            Ok(())
        })
        .await
        .map_err(|err| JournalError::Backend(err.to_string()))?
    }

    async fn write_close(&self, trade_id: &str, close: TradeClose) -> Result<(), JournalError> {
        let client = self.client.clone();
        let trade_id = trade_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = client.get_connection()?;
            let Some(mut row) = Self::get_row(&mut conn, &trade_id)? else {
                return Err(JournalError::NotFound(trade_id));
            };
            if row.close.is_some() {
                debug!(trade_id, "write_close replay ignored, row already closed");
                return Ok(());
            }
            row.close = Some(close);
            let json = serde_json::to_string(&row)?;
            let _: () = conn.set(row_key(&trade_id), json)?;
            Ok(())
        })
        .await
        .map_err(|err| JournalError::Backend(err.to_string()))?
    }

    async fn read(&self, trade_id: &str) -> Result<Option<TradeRecord>, JournalError> {
        let client = self.client.clone();
        let trade_id = trade_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = client.get_connection()?;
            Self::get_row(&mut conn, &trade_id)
        })
        .await
        .map_err(|err| JournalError::Backend(err.to_string()))?
    }
}
