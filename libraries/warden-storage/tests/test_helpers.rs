//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! so the unique email index and migrations are exercised as in production.

#![allow(dead_code)]

use sqlx::SqlitePool;
use tempfile::TempDir;
use warden_core::{NewUser, UserRecord, UserStore};
use warden_storage::SqliteUserStore;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = warden_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");

        warden_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store backed by this database
    pub fn store(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.pool.clone())
    }
}

/// Test fixture: build a `NewUser` with a placeholder hash
pub fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: format!("hash-of-{}", name),
    }
}

/// Test fixture: insert a user through the store
pub async fn create_test_user(store: &SqliteUserStore, name: &str, email: &str) -> UserRecord {
    store
        .create(new_user(name, email))
        .await
        .expect("Failed to create test user")
}
