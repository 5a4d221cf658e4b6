//! Warden Cache
//!
//! [`CacheBackend`](warden_core::CacheBackend) implementations.
//!
//! - [`RedisCache`]: pooled Redis connections (`bb8-redis`) with a hard time
//!   bound on every command, so an unreachable server fails fast instead of
//!   stalling requests
//! - [`MemoryCache`]: in-process maps with the same TTL and bounded-log
//!   semantics, for single-node deployments and tests
//!
//! Both report failures as [`CacheError`](warden_core::CacheError) and never
//! decide what a failure means for a request; that is up to the caller.

mod memory;
mod redis_backend;

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;
