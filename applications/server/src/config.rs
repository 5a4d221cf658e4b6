/// Server configuration
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file read when `--config` is not given; missing is fine
pub const DEFAULT_CONFIG_FILE: &str = "warden.toml";

/// bcrypt accepts costs in this range
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_cache")]
    pub cache: CacheSettings,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,

    #[serde(default = "default_audit")]
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Redis URL; when absent the in-process cache is used
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,

    /// Upper bound on each cache round trip
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditSettings {
    #[serde(default = "default_audit_key")]
    pub key: String,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `warden.toml` in the
    /// working directory is read if present. Environment variables prefixed
    /// `WARDEN_` override file values, with `__` between section and key
    /// (`WARDEN_AUTH__JWT_SECRET`).
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path.to_path_buf())),
            None => settings.add_source(
                config::File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
            ),
        };

        settings = settings.add_source(
            config::Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "JWT secret is required (set WARDEN_AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if !BCRYPT_COST_RANGE.contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "bcrypt cost {} is outside {}..={}",
                self.auth.bcrypt_cost,
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            )));
        }

        if self.auth.token_ttl_hours == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }

        if self.cache.user_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.user_ttl_secs must be positive".to_string(),
            ));
        }

        if self.cache.op_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.op_timeout_ms must be positive".to_string(),
            ));
        }

        if self.audit.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "audit.max_entries must be positive".to_string(),
            ));
        }

        if self.audit.retention_days == 0 {
            return Err(ConfigError::Invalid(
                "audit.retention_days must be positive".to_string(),
            ));
        }

        if self.audit.key.is_empty() {
            return Err(ConfigError::Invalid("audit.key must not be empty".to_string()));
        }

        Ok(())
    }
}

impl CacheSettings {
    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl AuthSettings {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(60 * 60))
    }
}

impl AuditSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/warden.db".to_string()
}

fn default_cache() -> CacheSettings {
    CacheSettings {
        redis_url: None,
        user_ttl_secs: default_user_ttl_secs(),
        op_timeout_ms: default_op_timeout_ms(),
    }
}

fn default_user_ttl_secs() -> u64 {
    300
}

fn default_op_timeout_ms() -> u64 {
    250
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: String::new(),
        token_ttl_hours: default_token_ttl_hours(),
        bcrypt_cost: default_bcrypt_cost(),
    }
}

fn default_token_ttl_hours() -> u64 {
    72
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_audit() -> AuditSettings {
    AuditSettings {
        key: default_audit_key(),
        max_entries: default_max_entries(),
        retention_days: default_retention_days(),
    }
}

fn default_audit_key() -> String {
    "audit:identity".to_string()
}

fn default_max_entries() -> usize {
    1000
}

fn default_retention_days() -> u64 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            cache: default_cache(),
            auth: default_auth(),
            audit: default_audit(),
        }
    }
}
