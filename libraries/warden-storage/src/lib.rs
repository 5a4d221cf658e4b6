//! Warden Storage
//!
//! `SQLite` implementation of the [`UserStore`](warden_core::UserStore)
//! capability.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `users` owns its queries and row mapping
//! - **Constraint-backed uniqueness**: the email index rejects duplicates even
//!   when two registrations race past the service's pre-check
//! - **Raw errors**: failures surface as [`StoreError`](warden_core::StoreError);
//!   translating them for end users is the service layer's job
//!
//! # Example
//!
//! ```rust,no_run
//! use warden_storage::{create_pool, run_migrations, SqliteUserStore};
//! use warden_core::{UserId, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://warden.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteUserStore::new(pool);
//! let page = store.list(0, 20).await?;
//! println!("{} users", page.total);
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod users;

pub use context::SqliteUserStore;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://warden.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    tracing::info!("SQLite pool ready");

    Ok(pool)
}
