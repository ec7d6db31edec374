//! Key management module
//!
//! This module handles signing configuration and key selection:
//! - Validation of raw JWT settings into a signing configuration
//! - Current and legacy key resolution with cached key ids
//! - JWKS and PEM export of public keys

mod config;
mod jwks;
mod provider;

#[cfg(test)]
mod tests;

pub use config::{SigningConfiguration, SigningMode, MIN_SYMMETRIC_KEY_LENGTH};
pub use jwks::{JsonWebKey, JsonWebKeySet, JwksExporter};
pub use provider::{KeyProvider, SigningKey, ValidationKey};
