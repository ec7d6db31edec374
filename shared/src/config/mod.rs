//! Configuration module
//!
//! - `auth` - Token signing keys, lifetimes and refresh-token policy
//! - `environment` - Environment detection and logging configuration

pub mod auth;
pub mod environment;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{JwtSettings, KeyFormat, KeyPairSettings, DEFAULT_AUDIENCE};
pub use environment::{Environment, LogFormat, LoggingConfig};

/// Errors raised while reading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {name}")]
    Missing { name: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Complete application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Token engine settings
    pub jwt: JwtSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::from_lookup(&lookup);
        Ok(Self {
            environment,
            jwt: JwtSettings::from_lookup(&lookup)?,
            logging: LoggingConfig::from_lookup(environment, &lookup),
        })
    }
}
