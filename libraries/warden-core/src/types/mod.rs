//! Core domain types for Warden

mod audit;
mod ids;
mod user;

pub use audit::{subject_for, AuditEvent, AuditOperation, AuditOutcome};
pub use ids::UserId;
pub use user::{NewUser, User, UserChanges, UserPage, UserRecord};
