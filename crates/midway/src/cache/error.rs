//! Error types for cache operations

/// Errors that can occur during cache operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The header field is empty or missing
    #[error("header field not exists")]
    HeaderNotExists,

    /// A header date could not be parsed
    #[error("{0}")]
    InvalidDate(String),

    /// Failed to serialize or deserialize a cached response
    #[error("Failed to serialize cache value: {0}")]
    SerializationError(String),

    /// A cached response cannot be turned back into a response
    #[error("Invalid cached response: {0}")]
    InvalidResponse(String),

    /// The backing store failed
    #[error("Cache store error: {0}")]
    StoreError(String),

    /// The configuration was rejected
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
