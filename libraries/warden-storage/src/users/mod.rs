//! User record queries

use crate::error::{map_read_error, map_write_error, StorageError};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use warden_core::{
    NewUser, StoreError, StoreResult, User, UserChanges, UserId, UserPage, UserRecord,
};

fn timestamp(row: &SqliteRow, column: &str) -> StoreResult<DateTime<Utc>> {
    let millis: i64 = row.try_get(column).map_err(map_read_error)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StorageError::CorruptRow(format!("{} out of range: {}", column, millis)).into()
    })
}

fn record_from_row(row: &SqliteRow) -> StoreResult<UserRecord> {
    Ok(UserRecord {
        user: User {
            id: UserId::new(row.try_get("id").map_err(map_read_error)?),
            name: row.try_get("name").map_err(map_read_error)?,
            email: row.try_get("email").map_err(map_read_error)?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        },
        password_hash: row.try_get("password_hash").map_err(map_read_error)?,
    })
}

/// Insert a new user
///
/// Returns `DuplicateKey` if the email is already registered, regardless of
/// any check the caller made beforehand.
pub async fn create(pool: &SqlitePool, user: NewUser) -> StoreResult<UserRecord> {
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(map_write_error)?;

    let id = UserId::new(result.last_insert_rowid());

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| StoreError::backend("Failed to retrieve created user"))
}

/// Get user by ID
pub async fn get_by_id(pool: &SqlitePool, id: UserId) -> StoreResult<Option<UserRecord>> {
    let row = sqlx::query(
        "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id.get())
    .fetch_optional(pool)
    .await
    .map_err(map_read_error)?;

    row.as_ref().map(record_from_row).transpose()
}

/// Get user by email (case-insensitive via the column collation)
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> StoreResult<Option<UserRecord>> {
    let row = sqlx::query(
        "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(map_read_error)?;

    row.as_ref().map(record_from_row).transpose()
}

/// Apply a partial update
///
/// Returns `None` if no user has this ID.
pub async fn update(
    pool: &SqlitePool,
    id: UserId,
    changes: UserChanges,
) -> StoreResult<Option<UserRecord>> {
    let now = Utc::now().timestamp_millis();

    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            password_hash = COALESCE(?, password_hash),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.name)
    .bind(changes.password_hash)
    .bind(now)
    .bind(id.get())
    .execute(pool)
    .await
    .map_err(map_write_error)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_by_id(pool, id).await
}

/// Delete user
///
/// Returns `false` if no user had this ID.
pub async fn delete(pool: &SqlitePool, id: UserId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.get())
        .execute(pool)
        .await
        .map_err(map_write_error)?;

    Ok(result.rows_affected() > 0)
}

/// List users ordered by ID with the total count
pub async fn list(pool: &SqlitePool, offset: i64, limit: i64) -> StoreResult<UserPage> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, email, password_hash, created_at, updated_at
        FROM users
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(map_read_error)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .map_err(map_read_error)?;

    let items = rows
        .iter()
        .map(|row| record_from_row(row).map(UserRecord::into_user))
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(UserPage { items, total })
}
