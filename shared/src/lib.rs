//! Shared configuration types for the identity platform token engine
//!
//! This crate holds the raw, deserializable settings consumed by the core:
//! - Token signing configuration (symmetric key or asymmetric key pairs)
//! - Refresh-token lifetime and rotation policy
//! - Environment detection and logging configuration

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, Environment, JwtSettings, KeyFormat, KeyPairSettings, LogFormat,
    LoggingConfig, DEFAULT_AUDIENCE,
};
