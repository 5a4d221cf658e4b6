//! Warden Server Library
//!
//! Identity and session service: registration, login with signed session
//! tokens, cached profile lookups and a bounded audit trail.
//!
//! The `warden` binary is a thin CLI over [`IdentityService`]; this library
//! exposes the same components for embedding and for tests.

pub mod config;
pub mod error;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{IdentityError, Result};
pub use services::{
    IdentityService, LoginRequest, RegisterRequest, Session, UpdateUserRequest,
};
pub use state::AppState;
