//! # Infrastructure Layer
//!
//! Concrete collaborators for the token engine in `idp_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Engine**: wiring of the core services to concrete backends
//! - **Repository**: in-memory refresh token store with per-scope unit of work
//! - **Cache**: two-factor placeholder caches (in-memory, Redis)
//! - **Settings**: `.env`-aware configuration loading
//! - **Telemetry**: tracing subscriber installation
//!
//! ## Features
//!
//! - `redis-cache`: Enable the Redis placeholder cache (default)

use idp_core::errors::DomainError;

/// Cache module - two-factor placeholder stores
pub mod cache;

/// Engine module - service wiring
pub mod engine;

/// Repository module - refresh token persistence
pub mod repository;

/// Settings module - configuration loading
pub mod settings;

/// Telemetry module - logging setup
pub mod telemetry;

pub use cache::MemoryPlaceholderCache;
pub use engine::TokenEngine;
#[cfg(feature = "redis-cache")]
pub use cache::RedisPlaceholderCache;
pub use repository::{MemoryRefreshTokenRepository, MemoryTokenStore};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] idp_shared::ConfigError),

    /// Logging setup error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        DomainError::Internal {
            message: error.to_string(),
        }
    }
}
