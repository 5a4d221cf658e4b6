/// Collaborator error types for Warden
use thiserror::Error;

/// Result type alias using `StoreError`
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias using `CacheError`
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Raw failures reported by a `UserStore` implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint (email) rejected the write
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// No row matched the lookup
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Any other driver or connection failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether this error means the row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Raw failures reported by a `CacheBackend` implementation
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable or refused the command
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Operation exceeded its time bound
    #[error("Cache operation timed out after {0} ms")]
    Timeout(u64),

    /// Stored payload could not be encoded or decoded
    #[error("Cache payload is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
