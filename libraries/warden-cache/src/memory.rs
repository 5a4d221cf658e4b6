/// In-process cache backend
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use warden_core::{CacheBackend, CacheResult, LogBounds};

struct StoredValue {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
struct ScoredLog {
    /// Ascending by score; equal scores keep insertion order
    entries: Vec<(i64, String)>,
    expires_at: Option<Instant>,
}

impl ScoredLog {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Cache backend kept in process memory
///
/// Expiry is evaluated lazily against `tokio::time::Instant`, so paused-clock
/// tests can advance past a TTL without sleeping.
#[derive(Default)]
pub struct MemoryCache {
    values: RwLock<HashMap<String, StoredValue>>,
    logs: RwLock<HashMap<String, ScoredLog>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live values, ignoring logs
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.values
            .read()
            .await
            .values()
            .filter(|v| v.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let values = self.values.read().await;

        Ok(values
            .get(key)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let mut values = self.values.write().await;

        values.retain(|_, stored| stored.expires_at > now);
        values.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn append_bounded(
        &self,
        key: &str,
        entry: &str,
        score: i64,
        bounds: LogBounds,
    ) -> CacheResult<()> {
        let now = Instant::now();
        let mut logs = self.logs.write().await;
        let log = logs.entry(key.to_string()).or_default();

        if log.is_expired(now) {
            log.entries.clear();
        }

        // Set semantics: re-adding an entry moves it to the new score
        log.entries.retain(|(_, existing)| existing != entry);
        let at = log.entries.partition_point(|(s, _)| *s <= score);
        log.entries.insert(at, (score, entry.to_string()));

        log.entries.retain(|(s, _)| *s >= bounds.min_score);
        if log.entries.len() > bounds.max_len {
            let excess = log.entries.len() - bounds.max_len;
            log.entries.drain(..excess);
        }

        log.expires_at = Some(now + bounds.ttl);
        Ok(())
    }

    async fn recent(&self, key: &str, min_score: i64, limit: usize) -> CacheResult<Vec<String>> {
        let now = Instant::now();
        let logs = self.logs.read().await;

        let Some(log) = logs.get(key).filter(|log| !log.is_expired(now)) else {
            return Ok(Vec::new());
        };

        Ok(log
            .entries
            .iter()
            .rev()
            .filter(|(s, _)| *s >= min_score)
            .take(limit)
            .map(|(_, e)| e.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(max_len: usize, min_score: i64) -> LogBounds {
        LogBounds {
            max_len,
            min_score,
            ttl: Duration::from_secs(60),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(5)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let cache = MemoryCache::new();
        cache.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn log_is_trimmed_to_max_len_keeping_newest() {
        let cache = MemoryCache::new();
        for i in 0..5 {
            cache
                .append_bounded("log", &format!("e{}", i), i, bounds(3, i64::MIN))
                .await
                .unwrap();
        }

        let recent = cache.recent("log", i64::MIN, 10).await.unwrap();
        assert_eq!(recent, vec!["e4", "e3", "e2"]);
    }

    #[tokio::test]
    async fn log_drops_entries_below_min_score() {
        let cache = MemoryCache::new();
        cache.append_bounded("log", "old", 10, bounds(100, 0)).await.unwrap();
        cache.append_bounded("log", "new", 50, bounds(100, 20)).await.unwrap();

        let recent = cache.recent("log", i64::MIN, 10).await.unwrap();
        assert_eq!(recent, vec!["new"]);
    }

    #[tokio::test]
    async fn out_of_order_scores_are_sorted() {
        let cache = MemoryCache::new();
        cache.append_bounded("log", "b", 2, bounds(10, 0)).await.unwrap();
        cache.append_bounded("log", "a", 1, bounds(10, 0)).await.unwrap();
        cache.append_bounded("log", "c", 3, bounds(10, 0)).await.unwrap();

        let recent = cache.recent("log", 0, 2).await.unwrap();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn whole_log_expires_after_inactivity() {
        let cache = MemoryCache::new();
        let b = LogBounds {
            max_len: 10,
            min_score: 0,
            ttl: Duration::from_secs(30),
        };
        cache.append_bounded("log", "x", 1, b).await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.recent("log", 0, 10).await.unwrap().is_empty());
    }
}
