//! Domain rules re-checked by the identity service
//!
//! Transport adapters validate shape before calling in; these checks hold the
//! invariants regardless of which adapter is in front.

use crate::error::{IdentityError, Result};

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_EMAIL_CHARS: usize = 180;
pub const MIN_PASSWORD_CHARS: usize = 6;
/// bcrypt ignores everything past 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Trim, collapse inner whitespace and capitalize each word
///
/// `"  ahmed   ali "` becomes `"Ahmed Ali"`.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emails are compared case-insensitively; store them lower-cased
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn check_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len < MIN_NAME_CHARS {
        return Err(IdentityError::validation(format!(
            "name must be at least {} characters",
            MIN_NAME_CHARS
        )));
    }
    if len > MAX_NAME_CHARS {
        return Err(IdentityError::validation(format!(
            "name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<()> {
    let invalid = || IdentityError::validation("email address is not valid");

    if email.chars().count() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty())
        && domain.contains('.');
    if !domain_ok {
        return Err(invalid());
    }

    Ok(())
}

pub fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(IdentityError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(IdentityError::validation(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}
