//! Configuration loading
//!
//! Reads `.env.{environment}` and then `.env` (neither overrides variables
//! already set in the process) before building [`AppConfig`] from the
//! environment.

use tracing::{debug, info, warn};

use idp_shared::{AppConfig, Environment};

use crate::InfrastructureError;

/// Load configuration from `.env` files and process environment
///
/// Missing `.env` files are not an error.
pub fn load() -> Result<AppConfig, InfrastructureError> {
    let environment = Environment::from_env();

    match dotenvy::from_filename(environment.env_file()) {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(InfrastructureError::General(format!("Failed to read environment file: {}", e))),
    }
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(InfrastructureError::General(format!("Failed to read .env: {}", e))),
    }

    let config = AppConfig::from_env()?;
    if config.environment.is_production() && config.jwt.uses_symmetric_key() {
        warn!("Symmetric signing in production; JWKS consumers cannot verify tokens");
    }
    info!(
        environment = %config.environment,
        issuer = %config.jwt.token_issuer,
        symmetric = config.jwt.uses_symmetric_key(),
        "Configuration loaded"
    );
    Ok(config)
}
