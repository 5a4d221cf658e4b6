use crate::users;
use async_trait::async_trait;
use sqlx::SqlitePool;
use warden_core::{
    NewUser, StoreError, StoreResult, UserChanges, UserId, UserPage, UserRecord, UserStore,
};

/// `SQLite`-backed user store
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn user_not_found(id: impl ToString) -> StoreError {
    StoreError::not_found("User", id.to_string())
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        users::create(&self.pool, user).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        users::get_by_email(&self.pool, email)
            .await?
            .ok_or_else(|| user_not_found(email))
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<UserRecord> {
        users::get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<UserRecord> {
        users::update(&self.pool, id, changes)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        if users::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(user_not_found(id))
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<UserPage> {
        users::list(&self.pool, offset, limit).await
    }
}
