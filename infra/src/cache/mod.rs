//! Cache module for two-factor placeholder storage
//!
//! This module provides the placeholder caches used between the first and
//! second login factor: an in-process cache and a Redis-backed cache for
//! multi-instance deployments.

pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

#[cfg(test)]
mod tests;

pub use memory::MemoryPlaceholderCache;
#[cfg(feature = "redis-cache")]
pub use self::redis::RedisPlaceholderCache;
