/// Redis cache backend
use async_trait::async_trait;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis;
use bb8_redis::RedisConnectionManager;
use std::future::Future;
use std::time::Duration;
use warden_core::{CacheBackend, CacheError, CacheResult, LogBounds};

const POOL_SIZE: u32 = 16;

/// Cache backend over a pooled Redis connection
///
/// The pool is built lazily: constructing a `RedisCache` never touches the
/// network, so the service can start while Redis is down and degrade to the
/// store until it comes back.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
    op_timeout: Duration,
}

impl RedisCache {
    /// Create a cache for `url` where every command is bounded by `op_timeout`
    ///
    /// # Errors
    /// Returns `Unavailable` if the URL cannot be parsed
    pub fn new(url: &str, op_timeout: Duration) -> CacheResult<Self> {
        let manager =
            RedisConnectionManager::new(url).map_err(|e| CacheError::unavailable(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .connection_timeout(op_timeout)
            .build_unchecked(manager);

        tracing::info!("Redis cache configured ({} ms op timeout)", op_timeout.as_millis());

        Ok(Self { pool, op_timeout })
    }

    async fn connection(&self) -> CacheResult<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::unavailable(e.to_string()))
    }

    async fn bounded<T>(&self, op: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout.as_millis() as u64))?
    }
}

fn command_error(err: redis::RedisError) -> CacheError {
    CacheError::unavailable(err.to_string())
}

/// Redis rejects zero-second expiries
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            redis::cmd("GET")
                .arg(key)
                .query_async::<Option<String>>(&mut *conn)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs(ttl))
                .query_async::<()>(&mut *conn)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn append_bounded(
        &self,
        key: &str,
        entry: &str,
        score: i64,
        bounds: LogBounds,
    ) -> CacheResult<()> {
        // Keep ranks -max_len..-1, i.e. the newest max_len members
        let last_dropped_rank = -(bounds.max_len as i64) - 1;

        self.bounded(async {
            let mut conn = self.connection().await?;

            let mut pipe = redis::pipe();
            pipe.atomic()
                .cmd("ZADD")
                .arg(key)
                .arg(score)
                .arg(entry)
                .ignore()
                .cmd("ZREMRANGEBYSCORE")
                .arg(key)
                .arg("-inf")
                .arg(format!("({}", bounds.min_score))
                .ignore()
                .cmd("ZREMRANGEBYRANK")
                .arg(key)
                .arg(0)
                .arg(last_dropped_rank)
                .ignore()
                .cmd("EXPIRE")
                .arg(key)
                .arg(ttl_secs(bounds.ttl))
                .ignore();

            pipe.query_async::<()>(&mut *conn)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn recent(&self, key: &str, min_score: i64, limit: usize) -> CacheResult<Vec<String>> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            redis::cmd("ZREVRANGEBYSCORE")
                .arg(key)
                .arg("+inf")
                .arg(min_score)
                .arg("LIMIT")
                .arg(0)
                .arg(limit)
                .query_async::<Vec<String>>(&mut *conn)
                .await
                .map_err(command_error)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_rounded_up() {
        assert_eq!(ttl_secs(Duration::ZERO), 1);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(300)), 300);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = RedisCache::new("not a url", Duration::from_millis(100));
        assert!(matches!(result, Err(CacheError::Unavailable(_))));
    }
}
