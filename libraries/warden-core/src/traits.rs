/// Capability traits for Warden backends
use crate::error::{CacheResult, StoreResult};
use crate::types::{NewUser, UserChanges, UserId, UserPage, UserRecord};
use async_trait::async_trait;
use std::time::Duration;

/// Durable user records
///
/// The store is the source of truth. Implementers must enforce email
/// uniqueness themselves and report a violation as
/// [`StoreError::DuplicateKey`](crate::StoreError::DuplicateKey), so that a
/// check-then-create race in the caller still surfaces as a duplicate.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return the stored row with its assigned id
    ///
    /// # Errors
    /// `DuplicateKey` when the email is already taken
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;

    /// Look a user up by (normalized) email
    ///
    /// # Errors
    /// `NotFound` when no row matches
    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord>;

    /// Look a user up by id
    ///
    /// # Errors
    /// `NotFound` when no row matches
    async fn find_by_id(&self, id: UserId) -> StoreResult<UserRecord>;

    /// Apply a partial update and return the new row
    ///
    /// # Errors
    /// `NotFound` when no row matches
    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<UserRecord>;

    /// Remove a user
    ///
    /// # Errors
    /// `NotFound` when no row matches
    async fn delete(&self, id: UserId) -> StoreResult<()>;

    /// List users ordered by id, together with the total row count
    async fn list(&self, offset: i64, limit: i64) -> StoreResult<UserPage>;
}

/// Retention bounds applied atomically on every log append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogBounds {
    /// Maximum number of entries kept; oldest are dropped first
    pub max_len: usize,

    /// Entries scored below this value are dropped
    pub min_score: i64,

    /// Expiry of the whole log key after the last append
    pub ttl: Duration,
}

/// Key-value cache with TTL support and a bounded, scored append log
///
/// Backends may be remote and transiently unavailable; every method must
/// return in bounded time and report failure as a [`CacheError`](crate::CacheError)
/// rather than block.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value, `None` on miss or expiry
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a value; removing a missing key is not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically append `entry` at `score` and trim the log to `bounds`
    ///
    /// Entries must be unique; appending an identical entry twice keeps one.
    async fn append_bounded(
        &self,
        key: &str,
        entry: &str,
        score: i64,
        bounds: LogBounds,
    ) -> CacheResult<()>;

    /// Newest-first entries scored at or above `min_score`, at most `limit`
    async fn recent(&self, key: &str, min_score: i64, limit: usize) -> CacheResult<Vec<String>>;
}
