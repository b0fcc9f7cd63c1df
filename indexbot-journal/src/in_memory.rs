use crate::error::JournalError;
use crate::record::{TradeClose, TradeRecord};
use crate::TradeJournal;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Process-local journal for tests and single-instance paper runs. No
/// durability across a restart - use [`RedisTradeJournal`](crate::RedisTradeJournal)
/// wherever a crash must not lose a trade's lifecycle record.
#[derive(Debug, Default)]
pub struct InMemoryTradeJournal {
    rows: Mutex<HashMap<String, TradeRecord>>,
}

impl InMemoryTradeJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeJournal for InMemoryTradeJournal {
    async fn write_open(&self, record: TradeRecord) -> Result<(), JournalError> {
        self.rows.lock().insert(record.trade_id.clone(), record);
        Ok(())
    }

    async fn write_close(&self, trade_id: &str, close: TradeClose) -> Result<(), JournalError> {
        let mut rows = self.rows.lock();
        let row = rows
            .get_mut(trade_id)
            .ok_or_else(|| JournalError::NotFound(trade_id.to_string()))?;
        if row.close.is_some() {
            debug!(trade_id, "write_close replay ignored, row already closed");
            return Ok(());
        }
        row.close = Some(close);
        Ok(())
    }

    async fn read(&self, trade_id: &str) -> Result<Option<TradeRecord>, JournalError> {
        Ok(self.rows.lock().get(trade_id).cloned())
    }
}
