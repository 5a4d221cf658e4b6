/// Read-through user profile cache
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use warden_core::{CacheBackend, CacheError, CacheResult, User, UserId};

/// Invalidation count for one user id, observed before a store read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Cache of `User` profiles keyed by id
///
/// Every backend failure degrades to a miss or a no-op with a warning; the
/// store stays the source of truth and requests never fail because of the
/// cache.
///
/// Each `invalidate` bumps a per-id generation. A read-through fill carries
/// the generation it saw before reading the store and is dropped if an
/// invalidation landed since, so a slow reader cannot write back a row older
/// than an acknowledged update or delete. Fills and invalidations hold the
/// generation lock across the backend call; plain reads do not take it.
#[derive(Clone)]
pub struct UserCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    generations: Arc<Mutex<HashMap<UserId, u64>>>,
}

fn cache_key(id: UserId) -> String {
    format!("user:{}", id)
}

fn encode(user: &User) -> CacheResult<String> {
    Ok(serde_json::to_string(user)?)
}

/// Decode a cached profile, rejecting entries stored under the wrong id
fn decode(id: UserId, payload: &str) -> CacheResult<User> {
    let user: User = serde_json::from_str(payload)?;
    if user.id != id {
        return Err(CacheError::unavailable(format!(
            "entry for user {} holds user {}",
            id, user.id
        )));
    }
    Ok(user)
}

impl UserCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached profile, `None` on miss or when the cache is unusable
    pub async fn get(&self, id: UserId) -> Option<User> {
        let key = cache_key(id);

        let payload = match self.backend.get(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!(user_id = %id, "User cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(user_id = %id, "User cache read failed, falling back to store: {}", e);
                return None;
            }
        };

        match decode(id, &payload) {
            Ok(user) => {
                tracing::debug!(user_id = %id, "User cache hit");
                Some(user)
            }
            Err(e) => {
                tracing::warn!(user_id = %id, "Discarding corrupt user cache entry: {}", e);
                self.invalidate(id).await;
                None
            }
        }
    }

    /// Snapshot to pass to [`UserCache::fill`]; take it before reading the store
    pub async fn generation(&self, id: UserId) -> Generation {
        let generations = self.generations.lock().await;
        Generation(generations.get(&id).copied().unwrap_or(0))
    }

    /// Populate the entry for `user.id` unless it was invalidated after `seen`
    pub async fn fill(&self, user: &User, seen: Generation) {
        let payload = match encode(user) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "User cache encode failed: {}", e);
                return;
            }
        };

        let generations = self.generations.lock().await;
        if generations.get(&user.id).copied().unwrap_or(0) != seen.0 {
            tracing::debug!(user_id = %user.id, "Skipping cache fill superseded by a write");
            return;
        }

        if let Err(e) = self.backend.set(&cache_key(user.id), &payload, self.ttl).await {
            tracing::warn!(user_id = %user.id, "User cache write failed: {}", e);
        }
    }

    /// Drop the entry for `id` so the next read goes to the store
    pub async fn invalidate(&self, id: UserId) {
        let mut generations = self.generations.lock().await;
        *generations.entry(id).or_insert(0) += 1;

        if let Err(e) = self.backend.delete(&cache_key(id)).await {
            tracing::warn!(
                user_id = %id,
                "User cache invalidation failed; entry may be stale until its TTL: {}",
                e
            );
        }
    }
}
