/// Storage-specific errors
use thiserror::Error;
use warden_core::StoreError;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored value could not be mapped back into a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::backend(err.to_string())
    }
}

/// Translate a write failure, recognising unique-constraint violations
pub(crate) fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateKey("users.email".to_string())
        }
        _ => StorageError::from(err).into(),
    }
}

/// Translate a read failure
pub(crate) fn map_read_error(err: sqlx::Error) -> StoreError {
    StorageError::from(err).into()
}
