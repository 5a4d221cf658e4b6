//! Warden Core
//!
//! Backend-agnostic domain types, capability traits, and collaborator errors
//! for the Warden identity service.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `UserRecord`, `UserPage`, `AuditEvent`
//! - **Capability Traits**: `UserStore` (durable records) and `CacheBackend`
//!   (key-value with TTL plus a bounded append log)
//! - **Error Handling**: raw `StoreError` and `CacheError` surfaced by the
//!   backends; translation into user-facing kinds happens in the service layer
//!
//! # Example
//!
//! ```rust
//! use warden_core::types::{AuditEvent, AuditOperation, NewUser, UserId};
//!
//! let new_user = NewUser {
//!     name: "Ada Lovelace".to_string(),
//!     email: "ada@example.com".to_string(),
//!     password_hash: "$2b$04$...".to_string(),
//! };
//!
//! let event = AuditEvent::success(AuditOperation::Register, UserId::new(1));
//! assert_eq!(event.subject, "user:1");
//! # let _ = new_user;
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CacheError, CacheResult, StoreError, StoreResult};
pub use traits::{CacheBackend, LogBounds, UserStore};

pub use types::{
    AuditEvent, AuditOperation, AuditOutcome, NewUser, User, UserChanges, UserId, UserPage,
    UserRecord,
};
