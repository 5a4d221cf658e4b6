/// Identity error types
use thiserror::Error;
use warden_core::StoreError;

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors returned to callers of the identity service
///
/// Display strings are safe to show to end users: they never reveal whether
/// an email is registered and never carry driver or stack detail.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User already exists")]
    AlreadyExists,

    /// Covers both unknown email and wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    /// Covers expired, malformed and tampered tokens alike
    #[error("Invalid token")]
    TokenInvalid,

    #[error("Internal server error")]
    Internal,
}

impl IdentityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Reason code recorded in audit events
    pub fn reason(&self) -> &'static str {
        match self {
            IdentityError::Validation(_) => "validation",
            IdentityError::AlreadyExists => "already_exists",
            IdentityError::InvalidCredentials => "invalid_credentials",
            IdentityError::NotFound => "not_found",
            IdentityError::TokenInvalid => "token_invalid",
            IdentityError::Internal => "internal",
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(_) => IdentityError::AlreadyExists,
            StoreError::NotFound { .. } => IdentityError::NotFound,
            StoreError::Backend(ref msg) => {
                tracing::error!("Store error: {}", msg);
                IdentityError::Internal
            }
        }
    }
}
