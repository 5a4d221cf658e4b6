/// Identity service - registration, login and profile management
use super::audit::AuditLog;
use super::password::PasswordHasher;
use super::tokens::TokenIssuer;
use super::user_cache::UserCache;
use super::validation::{
    check_email, check_name, check_password, normalize_email, normalize_name,
};
use crate::error::{IdentityError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{
    types::subject_for, AuditEvent, AuditOperation, NewUser, User, UserChanges, UserId, UserPage,
    UserStore,
};

/// Largest page `list_users` will return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Hashed at construction so unknown-email logins cost one bcrypt verify
const TIMING_PAD_PASSWORD: &str = "warden-timing-pad";

pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial profile update; `None` fields are left untouched
#[derive(Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a successful login
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Orchestrates the store, profile cache, audit log, hasher and tokens
///
/// The store is the source of truth. The cache is read-through on
/// `get_by_id` and invalidated on every write before the write is
/// acknowledged. Register, login, update and delete each leave an audit
/// event whether they succeed or fail.
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    cache: UserCache,
    audit: AuditLog,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    token_ttl: Duration,
    timing_pad: Option<String>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: UserCache,
        audit: AuditLog,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        token_ttl: Duration,
    ) -> Self {
        // Computed up front so the first unknown-email login is not slower
        // than later ones
        let timing_pad = match hasher.hash(TIMING_PAD_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!("Failed to prepare login timing pad: {}", e);
                None
            }
        };

        Self {
            store,
            cache,
            audit,
            hasher,
            tokens,
            token_ttl,
            timing_pad,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    // ========================================================================
    // Registration and login
    // ========================================================================

    /// Create an account
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let email = normalize_email(&request.email);
        let result = self
            .register_inner(&request.name, &email, request.password)
            .await;

        match &result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                self.audit
                    .record(AuditEvent::success(AuditOperation::Register, user.id))
                    .await;
            }
            Err(e) => {
                self.audit
                    .record(AuditEvent::failure(
                        AuditOperation::Register,
                        email.as_str(),
                        e.reason(),
                    ))
                    .await;
            }
        }

        result
    }

    async fn register_inner(&self, raw_name: &str, email: &str, password: String) -> Result<User> {
        let name = normalize_name(raw_name);
        check_name(&name)?;
        check_email(email)?;
        check_password(&password)?;

        match self.store.find_by_email(email).await {
            Ok(_) => return Err(IdentityError::AlreadyExists),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = self.hash_password(password).await?;

        // A concurrent registration can still win between the lookup and
        // the insert; the store's unique index reports it as DuplicateKey.
        let record = self
            .store
            .create(NewUser {
                name,
                email: email.to_string(),
                password_hash,
            })
            .await?;

        Ok(record.into_user())
    }

    /// Exchange credentials for a signed session token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        let email = normalize_email(&request.email);
        let result = self.login_inner(&email, request.password).await;

        match &result {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "User logged in");
                self.audit
                    .record(AuditEvent::success(AuditOperation::Login, session.user.id))
                    .await;
            }
            Err(e) => {
                tracing::info!(reason = e.reason(), "Login rejected");
                self.audit
                    .record(AuditEvent::failure(
                        AuditOperation::Login,
                        email.as_str(),
                        e.reason(),
                    ))
                    .await;
            }
        }

        result
    }

    async fn login_inner(&self, email: &str, password: String) -> Result<Session> {
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::validation("email and password are required"));
        }

        let record = match self.store.find_by_email(email).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                self.pad_missing_user(password).await;
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self
            .verify_password(record.password_hash.clone(), password)
            .await
        {
            return Err(IdentityError::InvalidCredentials);
        }

        let issued = self
            .tokens
            .issue(record.user.id, &record.user.email, self.token_ttl)?;

        Ok(Session {
            token: issued.token,
            expires_at: issued.expires_at,
            user: record.into_user(),
        })
    }

    /// Resolve a session token to the current profile
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let verified = self.tokens.verify(token)?;
        self.get_by_id(verified.subject).await
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Look up a profile, reading through the cache
    pub async fn get_by_id(&self, id: UserId) -> Result<User> {
        if let Some(user) = self.cache.get(id).await {
            return Ok(user);
        }

        let seen = self.cache.generation(id).await;
        let user = self.store.find_by_id(id).await?.into_user();
        self.cache.fill(&user, seen).await;

        Ok(user)
    }

    /// Change a user's name and/or password
    pub async fn update_user(&self, id: UserId, request: UpdateUserRequest) -> Result<User> {
        let result = self.update_inner(id, request).await;

        // Invalidate even on failure: the store may have applied the write
        // before reporting an error.
        self.cache.invalidate(id).await;

        match &result {
            Ok(_) => {
                tracing::info!(user_id = %id, "User updated");
                self.audit
                    .record(AuditEvent::success(AuditOperation::Update, id))
                    .await;
            }
            Err(e) => {
                self.audit
                    .record(AuditEvent::failure(
                        AuditOperation::Update,
                        subject_for(id),
                        e.reason(),
                    ))
                    .await;
            }
        }

        result
    }

    async fn update_inner(&self, id: UserId, request: UpdateUserRequest) -> Result<User> {
        if request.name.is_none() && request.password.is_none() {
            return Err(IdentityError::validation(
                "at least one of name or password is required",
            ));
        }

        let name = match request.name {
            Some(raw) => {
                let name = normalize_name(&raw);
                check_name(&name)?;
                Some(name)
            }
            None => None,
        };
        if let Some(password) = &request.password {
            check_password(password)?;
        }

        let current = self.store.find_by_id(id).await?;

        let password_hash = match request.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            name: name.filter(|name| *name != current.user.name),
            password_hash,
        };

        if changes.is_empty() {
            tracing::debug!(user_id = %id, "Update is a no-op");
            return Ok(current.into_user());
        }

        Ok(self.store.update(id, changes).await?.into_user())
    }

    /// Remove an account
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        let result = self.store.delete(id).await.map_err(IdentityError::from);
        self.cache.invalidate(id).await;

        match &result {
            Ok(()) => {
                tracing::info!(user_id = %id, "User deleted");
                self.audit
                    .record(AuditEvent::success(AuditOperation::Delete, id))
                    .await;
            }
            Err(e) => {
                self.audit
                    .record(AuditEvent::failure(
                        AuditOperation::Delete,
                        subject_for(id),
                        e.reason(),
                    ))
                    .await;
            }
        }

        result
    }

    /// One page of users ordered by id; `page` is 1-based
    pub async fn list_users(&self, page: u32, limit: u32) -> Result<UserPage> {
        if page == 0 {
            return Err(IdentityError::validation("page must be at least 1"));
        }
        if limit == 0 {
            return Err(IdentityError::validation("limit must be at least 1"));
        }

        let limit = limit.min(MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        Ok(self.store.list(offset, i64::from(limit)).await?)
    }

    /// Newest audit events, for operators
    pub async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEvent>> {
        self.audit.recent(limit).await.map_err(|e| {
            tracing::error!("Audit log unavailable: {}", e);
            IdentityError::Internal
        })
    }

    // ========================================================================
    // bcrypt off the async workers
    // ========================================================================

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher;
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {}", e);
                IdentityError::Internal
            })??;

        Ok(hashed)
    }

    async fn verify_password(&self, hash: String, password: String) -> bool {
        let hasher = self.hasher;
        match tokio::task::spawn_blocking(move || hasher.verify(&hash, &password)).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Spend one verify on a throwaway hash so a missing account takes as
    /// long to reject as a wrong password
    async fn pad_missing_user(&self, password: String) {
        if let Some(hash) = &self.timing_pad {
            self.verify_password(hash.clone(), password).await;
        }
    }
}
