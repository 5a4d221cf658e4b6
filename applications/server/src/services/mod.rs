/// Identity services
pub mod audit;
pub mod identity;
pub mod password;
pub mod tokens;
pub mod user_cache;
pub mod validation;

pub use audit::AuditLog;
pub use identity::{
    IdentityService, LoginRequest, RegisterRequest, Session, UpdateUserRequest, MAX_PAGE_SIZE,
};
pub use password::{HashError, PasswordHasher};
pub use tokens::{Claims, IssuedToken, TokenError, TokenIssuer, VerifiedToken};
pub use user_cache::UserCache;
