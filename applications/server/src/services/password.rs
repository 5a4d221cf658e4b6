/// Password hashing
use crate::error::IdentityError;
use thiserror::Error;

/// Hashing failed inside bcrypt (RNG or parameter failure)
#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct HashError(#[from] bcrypt::BcryptError);

impl From<HashError> for IdentityError {
    fn from(err: HashError) -> Self {
        tracing::error!("{}", err);
        IdentityError::Internal
    }
}

/// Salted bcrypt hasher
///
/// Every hash embeds its own random salt, so hashing the same password twice
/// yields different strings that both verify.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Verify a password against a hash
    ///
    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, hash: &str, plaintext: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
