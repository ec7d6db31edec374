//! Validated signing configuration

use std::str::FromStr;
use std::time::Instant;

use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;

use idp_shared::{JwtSettings, DEFAULT_AUDIENCE};

use crate::crypto::AsymmetricKeyPair;
use crate::domain::value_objects::RefreshTokenUpdatePolicy;
use crate::errors::SetupError;

/// Shortest accepted HMAC secret, in characters
pub const MIN_SYMMETRIC_KEY_LENGTH: usize = 32;

/// How tokens are signed
///
/// Symmetric mode is chosen exactly when a non-empty symmetric key is
/// configured; asymmetric key pairs are ignored in that case.
#[derive(Clone)]
pub enum SigningMode {
    Symmetric {
        key: String,
    },
    Asymmetric {
        current: AsymmetricKeyPair,
        /// Retired pairs, validation only, in configured order
        legacy: Vec<AsymmetricKeyPair>,
    },
}

impl std::fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMode::Symmetric { .. } => f
                .debug_struct("Symmetric")
                .field("key", &"<redacted>")
                .finish(),
            SigningMode::Asymmetric { current, legacy } => f
                .debug_struct("Asymmetric")
                .field("current", current)
                .field("legacy", &legacy.len())
                .finish(),
        }
    }
}

/// Immutable, validated form of [`JwtSettings`]
///
/// Built once at startup and passed to every component constructor.
#[derive(Debug, Clone)]
pub struct SigningConfiguration {
    pub mode: SigningMode,
    pub issuer: String,
    pub audience: String,
    pub symmetric_algorithm: Algorithm,
    pub asymmetric_algorithm: Algorithm,
    pub token_lifetime: Duration,
    pub refresh_tokens_enabled: bool,
    pub refresh_token_lifetime: Duration,
    pub refresh_token_update_policy: RefreshTokenUpdatePolicy,
    pub two_factor_token_ttl: std::time::Duration,
}

impl SigningConfiguration {
    /// Validate raw settings
    ///
    /// # Errors
    ///
    /// Any `SetupError`; required values are never defaulted.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, SetupError> {
        let issuer = settings.token_issuer.trim();
        if issuer.is_empty() {
            return Err(SetupError::MissingIssuer);
        }

        let symmetric_algorithm = parse_algorithm(&settings.symmetric_algorithm)?;
        if !is_hmac(symmetric_algorithm) {
            return Err(SetupError::AlgorithmMismatch {
                algorithm: settings.symmetric_algorithm.clone(),
                mode: "symmetric",
            });
        }
        let asymmetric_algorithm = parse_algorithm(&settings.asymmetric_algorithm)?;
        if !is_rsa(asymmetric_algorithm) {
            return Err(SetupError::AlgorithmMismatch {
                algorithm: settings.asymmetric_algorithm.clone(),
                mode: "asymmetric",
            });
        }

        let token_lifetime = lifetime_minutes("token expiration minutes", settings.token_expiration_minutes)?;
        let refresh_token_lifetime = lifetime_minutes(
            "refresh token time span minutes",
            settings.refresh_token_time_span_minutes,
        )?;
        let two_factor_token_ttl = two_factor_ttl(settings.two_factor_token_ttl_seconds)?;

        let mode = match settings.symmetric_signing_key.as_deref() {
            Some(key) if !key.is_empty() => {
                let actual = key.chars().count();
                if actual < MIN_SYMMETRIC_KEY_LENGTH {
                    return Err(SetupError::SymmetricKeyTooShort {
                        min: MIN_SYMMETRIC_KEY_LENGTH,
                        actual,
                    });
                }
                SigningMode::Symmetric {
                    key: key.to_string(),
                }
            }
            _ => {
                let current = settings
                    .current_asymmetric_key_pair
                    .as_ref()
                    .ok_or(SetupError::MissingAsymmetricKeyPair)?;
                let current = AsymmetricKeyPair::from_settings(current).map_err(|source| {
                    SetupError::InvalidKeyPair {
                        slot: "current".to_string(),
                        source,
                    }
                })?;
                let legacy = settings
                    .legacy_asymmetric_key_pairs
                    .iter()
                    .enumerate()
                    .map(|(index, pair)| {
                        AsymmetricKeyPair::from_settings(pair).map_err(|source| {
                            SetupError::InvalidKeyPair {
                                slot: format!("legacy[{}]", index),
                                source,
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                SigningMode::Asymmetric { current, legacy }
            }
        };

        let audience = settings
            .application_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_AUDIENCE)
            .to_string();

        Ok(Self {
            mode,
            issuer: issuer.to_string(),
            audience,
            symmetric_algorithm,
            asymmetric_algorithm,
            token_lifetime,
            refresh_tokens_enabled: settings.refresh_tokens_enabled,
            refresh_token_lifetime,
            refresh_token_update_policy: RefreshTokenUpdatePolicy::parse(
                settings.refresh_token_update_policy.as_deref(),
            ),
            two_factor_token_ttl,
        })
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self.mode, SigningMode::Symmetric { .. })
    }

    /// Algorithm used for signing in the active mode
    pub fn signing_algorithm(&self) -> Algorithm {
        match self.mode {
            SigningMode::Symmetric { .. } => self.symmetric_algorithm,
            SigningMode::Asymmetric { .. } => self.asymmetric_algorithm,
        }
    }
}

/// Positive lifetime whose expiry is representable from now
fn lifetime_minutes(name: &'static str, minutes: i64) -> Result<Duration, SetupError> {
    let invalid = || SetupError::InvalidLifetime { name, value: minutes };
    if minutes <= 0 {
        return Err(invalid());
    }
    let lifetime = Duration::try_minutes(minutes).ok_or_else(invalid)?;
    Utc::now().checked_add_signed(lifetime).ok_or_else(invalid)?;
    Ok(lifetime)
}

fn two_factor_ttl(seconds: u64) -> Result<std::time::Duration, SetupError> {
    let ttl = std::time::Duration::from_secs(seconds);
    if seconds == 0 || Instant::now().checked_add(ttl).is_none() {
        return Err(SetupError::InvalidLifetime {
            name: "two-factor token TTL seconds",
            value: i64::try_from(seconds).unwrap_or(i64::MAX),
        });
    }
    Ok(ttl)
}

fn parse_algorithm(name: &str) -> Result<Algorithm, SetupError> {
    Algorithm::from_str(name.trim()).map_err(|_| SetupError::UnsupportedAlgorithm {
        algorithm: name.to_string(),
    })
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}
