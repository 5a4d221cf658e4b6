/// Shared application state
use crate::config::{CacheSettings, ServerConfig};
use crate::services::{AuditLog, IdentityService, PasswordHasher, TokenIssuer, UserCache};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use warden_cache::{MemoryCache, RedisCache};
use warden_core::{CacheBackend, UserStore};
use warden_storage::SqliteUserStore;

/// Application state shared across all adapters
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }

    /// Open the database, pick a cache backend and wire the identity service
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        ensure_database_dir(&config.storage.database_url).await?;

        let pool = warden_storage::create_pool(&config.storage.database_url)
            .await
            .context("Failed to open database")?;
        warden_storage::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Database connected");

        let store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));
        let backend = cache_backend(&config.cache)?;

        Ok(Self::from_parts(store, backend, config))
    }

    /// Wire the service over already-built store and cache handles
    pub fn from_parts(
        store: Arc<dyn UserStore>,
        backend: Arc<dyn CacheBackend>,
        config: &ServerConfig,
    ) -> Self {
        let cache = UserCache::new(Arc::clone(&backend), config.cache.user_ttl());
        let audit = AuditLog::new(
            backend,
            config.audit.key.clone(),
            config.audit.max_entries,
            config.audit.retention(),
        );

        let identity = IdentityService::new(
            store,
            cache,
            audit,
            PasswordHasher::new(config.auth.bcrypt_cost),
            TokenIssuer::new(&config.auth.jwt_secret),
            config.auth.token_ttl(),
        );

        Self::new(Arc::new(identity))
    }
}

fn cache_backend(settings: &CacheSettings) -> anyhow::Result<Arc<dyn CacheBackend>> {
    match &settings.redis_url {
        Some(url) => {
            // The pool connects lazily; an unreachable Redis only degrades
            // caching and auditing, it does not stop startup.
            let cache = RedisCache::new(url, settings.op_timeout())
                .context("Invalid cache.redis_url")?;
            tracing::info!("Using Redis cache backend");
            Ok(Arc::new(cache))
        }
        None => {
            tracing::info!("No Redis URL configured; using in-process cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

/// `create_if_missing` makes the file but not its directory
async fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Ok(())
}
