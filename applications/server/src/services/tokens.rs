/// Session tokens - HS256 JWT issuance and verification
use crate::error::IdentityError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use warden_core::UserId;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Expired, malformed, or signed with another secret
    #[error("Token is invalid")]
    Invalid,

    #[error("Token lifetime out of range")]
    TtlOutOfRange,

    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

impl From<TokenError> for IdentityError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => IdentityError::TokenInvalid,
            other => {
                tracing::error!("{}", other);
                IdentityError::Internal
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
    pub eml: String, // Email at issuance
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity carried by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: UserId,
    pub email: String,
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a token valid for `ttl` from now
    pub fn issue(&self, subject: UserId, email: &str, ttl: Duration) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, email, ttl, Utc::now())
    }

    /// Create a token as if issued at `now`
    pub fn issue_at(
        &self,
        subject: UserId,
        email: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::TtlOutOfRange)?;
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::TtlOutOfRange)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            eml: email.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Verify and decode a token against the current time
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify and decode a token as of `now`
    ///
    /// Expiry is checked here rather than by `jsonwebtoken`, whose check
    /// treats `exp == now` as still valid. A token is dead from its
    /// expiry second onward.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                TokenError::Invalid
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Invalid);
        }

        let subject = claims.sub.parse::<UserId>().map_err(|_| TokenError::Invalid)?;

        Ok(VerifiedToken {
            subject,
            email: claims.eml,
        })
    }
}
