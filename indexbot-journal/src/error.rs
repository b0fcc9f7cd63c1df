use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal row not found for trade_id {0}")]
    NotFound(String),
    #[error("journal serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("journal backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for JournalError {
    fn from(err: redis::RedisError) -> Self {
        JournalError::Backend(err.to_string())
    }
}
