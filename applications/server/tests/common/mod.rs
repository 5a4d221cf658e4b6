//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use warden_cache::MemoryCache;
use warden_core::{
    CacheBackend, CacheError, CacheResult, LogBounds, NewUser, StoreError, StoreResult,
    UserChanges, UserId, UserPage, UserRecord, UserStore,
};
use warden_server::{
    AppState, IdentityService, LoginRequest, RegisterRequest, ServerConfig, UpdateUserRequest,
};
use warden_storage::SqliteUserStore;

/// Test user credentials
pub mod fixtures {
    pub const TEST_SECRET: &str = "integration-test-secret";
    pub const TEST_PASSWORD: &str = "TestPassword123!";
    pub const OTHER_PASSWORD: &str = "OtherPassword456!";
}

/// Configuration with the cheapest bcrypt cost and a fixed secret
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.jwt_secret = fixtures::TEST_SECRET.to_string();
    config.auth.bcrypt_cost = 4;
    config.audit.key = "audit:test".to_string();
    config
}

/// Identity service over a real SQLite file and a chosen cache backend
pub struct TestEnv {
    pub identity: Arc<IdentityService>,
    pub store: Arc<SqliteUserStore>,
    pub cache: Arc<dyn CacheBackend>,
    _temp_dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_cache(Arc::new(MemoryCache::new())).await
    }

    pub async fn with_cache(cache: Arc<dyn CacheBackend>) -> Self {
        Self::with_config(cache, test_config()).await
    }

    pub async fn with_config(cache: Arc<dyn CacheBackend>, config: ServerConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let pool = warden_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");
        warden_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let store = Arc::new(SqliteUserStore::new(pool));
        let state = AppState::from_parts(store.clone(), cache.clone(), &config);

        Self {
            identity: state.identity,
            store,
            cache,
            _temp_dir: temp_dir,
        }
    }

    /// Register a user with the shared test password
    pub async fn register(&self, name: &str, email: &str) -> warden_core::User {
        self.identity
            .register(register_request(name, email, fixtures::TEST_PASSWORD))
            .await
            .expect("Failed to register test user")
    }
}

/// Identity service whose store always fails; the cache is in-process
pub fn failing_store_service() -> Arc<IdentityService> {
    AppState::from_parts(
        Arc::new(FailingStore),
        Arc::new(MemoryCache::new()),
        &test_config(),
    )
    .identity
}

/// Identity service over any store, with its own in-process cache
pub fn service_over(
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CacheBackend>,
) -> Arc<IdentityService> {
    AppState::from_parts(store, cache, &test_config()).identity
}

pub fn register_request(name: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn rename(name: &str) -> UpdateUserRequest {
    UpdateUserRequest {
        name: Some(name.to_string()),
        password: None,
    }
}

/// Cache backend that is always unreachable
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Timeout(250))
    }

    async fn append_bounded(
        &self,
        _key: &str,
        _entry: &str,
        _score: i64,
        _bounds: LogBounds,
    ) -> CacheResult<()> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn recent(&self, _key: &str, _min_score: i64, _limit: usize) -> CacheResult<Vec<String>> {
        Err(CacheError::unavailable("connection refused"))
    }
}

/// User store whose backend is always down
pub struct FailingStore;

fn store_down() -> StoreError {
    StoreError::backend("database is locked at /var/lib/warden/warden.db")
}

#[async_trait]
impl UserStore for FailingStore {
    async fn create(&self, _user: NewUser) -> StoreResult<UserRecord> {
        Err(store_down())
    }

    async fn find_by_email(&self, _email: &str) -> StoreResult<UserRecord> {
        Err(store_down())
    }

    async fn find_by_id(&self, _id: UserId) -> StoreResult<UserRecord> {
        Err(store_down())
    }

    async fn update(&self, _id: UserId, _changes: UserChanges) -> StoreResult<UserRecord> {
        Err(store_down())
    }

    async fn delete(&self, _id: UserId) -> StoreResult<()> {
        Err(store_down())
    }

    async fn list(&self, _offset: i64, _limit: i64) -> StoreResult<UserPage> {
        Err(store_down())
    }
}

/// Store whose `find_by_email` misses but whose `create` hits the unique
/// index, as when another registration wins between lookup and insert
pub struct LosingRaceStore;

#[async_trait]
impl UserStore for LosingRaceStore {
    async fn create(&self, _user: NewUser) -> StoreResult<UserRecord> {
        Err(StoreError::DuplicateKey("users.email".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        Err(StoreError::not_found("User", email))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<UserRecord> {
        Err(StoreError::not_found("User", id.to_string()))
    }

    async fn update(&self, id: UserId, _changes: UserChanges) -> StoreResult<UserRecord> {
        Err(StoreError::not_found("User", id.to_string()))
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        Err(StoreError::not_found("User", id.to_string()))
    }

    async fn list(&self, _offset: i64, _limit: i64) -> StoreResult<UserPage> {
        Err(store_down())
    }
}

/// Wraps a real store and, once armed, holds the next `find_by_id` after it
/// has loaded its row until released
pub struct PausingStore {
    inner: Arc<SqliteUserStore>,
    armed: AtomicBool,
    loaded: Notify,
    release: Notify,
}

impl PausingStore {
    pub fn new(inner: Arc<SqliteUserStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            loaded: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Pause the next `find_by_id`
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until the paused read has loaded its row
    pub async fn wait_loaded(&self) {
        self.loaded.notified().await;
    }

    /// Let the paused read return
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl UserStore for PausingStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        self.inner.create(user).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<UserRecord> {
        let record = self.inner.find_by_id(id).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.loaded.notify_one();
            self.release.notified().await;
        }
        record
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<UserRecord> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        self.inner.delete(id).await
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<UserPage> {
        self.inner.list(offset, limit).await
    }
}
