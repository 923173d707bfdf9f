use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("write lock not acquired within {0}ms")]
    Busy(u64),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Callers should retry `Busy` failures; everything else is terminal
    /// for the request that hit it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}
