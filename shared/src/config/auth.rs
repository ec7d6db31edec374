//! Token signing and refresh-token configuration
//!
//! These are the raw settings as read from the environment or a config file.
//! Nothing here is validated beyond parsing; the core crate turns a
//! [`JwtSettings`] into a validated signing configuration and fails fast
//! when required values are missing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Audience used when no application name is configured
pub const DEFAULT_AUDIENCE: &str = "public";

/// Encoding of configured key material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// PEM armored DER (SPKI / PKCS#1 public, PKCS#8 / PKCS#1 private)
    #[default]
    Pem,
    /// `<RSAKeyValue>` XML documents
    Xml,
}

impl std::str::FromStr for KeyFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pem" => Ok(KeyFormat::Pem),
            "xml" => Ok(KeyFormat::Xml),
            other => Err(ConfigError::InvalidValue {
                name: "JWT_KEY_FORMAT".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// One asymmetric key pair as configured
#[derive(Clone, Deserialize, Serialize)]
pub struct KeyPairSettings {
    /// Key encoding
    #[serde(default)]
    pub format: KeyFormat,
    /// Public key material
    pub public_key: String,
    /// Private key material
    pub private_key: String,
}

impl std::fmt::Debug for KeyPairSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairSettings")
            .field("format", &self.format)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl KeyPairSettings {
    /// Create settings from in-memory PEM strings
    pub fn pem(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            format: KeyFormat::Pem,
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Create settings from in-memory XML documents
    pub fn xml(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            format: KeyFormat::Xml,
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Read a key pair from a public and a private key file
    pub fn from_files<P: AsRef<Path>>(
        format: KeyFormat,
        public_key_path: P,
        private_key_path: P,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            format,
            public_key: read_key_file(public_key_path.as_ref())?,
            private_key: read_key_file(private_key_path.as_ref())?,
        })
    }
}

/// JWT issuance and refresh-token settings
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtSettings {
    /// HMAC secret; when non-empty, tokens are signed symmetrically
    #[serde(default)]
    pub symmetric_signing_key: Option<String>,

    /// Access token lifetime in minutes
    #[serde(default = "default_token_expiration_minutes")]
    pub token_expiration_minutes: i64,

    /// Issuer claim and the issuer accepted on validation
    pub token_issuer: String,

    /// Audience claim; falls back to [`DEFAULT_AUDIENCE`]
    #[serde(default)]
    pub application_name: Option<String>,

    /// Algorithm used with the symmetric key
    #[serde(default = "default_symmetric_algorithm")]
    pub symmetric_algorithm: String,

    /// Algorithm used with the asymmetric keys
    #[serde(default = "default_asymmetric_algorithm")]
    pub asymmetric_algorithm: String,

    /// Key pair used for signing in asymmetric mode
    #[serde(default)]
    pub current_asymmetric_key_pair: Option<KeyPairSettings>,

    /// Retired key pairs, accepted for validation only
    #[serde(default)]
    pub legacy_asymmetric_key_pairs: Vec<KeyPairSettings>,

    /// Global switch for refresh tokens
    #[serde(default = "default_refresh_tokens_enabled")]
    pub refresh_tokens_enabled: bool,

    /// Rotation policy name (Never, Always, QuarterLife, HalfLife, ThreeQuarterLife)
    #[serde(default)]
    pub refresh_token_update_policy: Option<String>,

    /// Refresh token lifetime in minutes
    #[serde(default = "default_refresh_token_time_span_minutes")]
    pub refresh_token_time_span_minutes: i64,

    /// Lifetime of the two-factor placeholder token in seconds
    #[serde(default = "default_two_factor_token_ttl_seconds")]
    pub two_factor_token_ttl_seconds: u64,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field(
                "symmetric_signing_key",
                &self.symmetric_signing_key.as_ref().map(|_| "<redacted>"),
            )
            .field("token_expiration_minutes", &self.token_expiration_minutes)
            .field("token_issuer", &self.token_issuer)
            .field("application_name", &self.application_name)
            .field("symmetric_algorithm", &self.symmetric_algorithm)
            .field("asymmetric_algorithm", &self.asymmetric_algorithm)
            .field("current_asymmetric_key_pair", &self.current_asymmetric_key_pair)
            .field("legacy_asymmetric_key_pairs", &self.legacy_asymmetric_key_pairs.len())
            .field("refresh_tokens_enabled", &self.refresh_tokens_enabled)
            .field("refresh_token_update_policy", &self.refresh_token_update_policy)
            .field("refresh_token_time_span_minutes", &self.refresh_token_time_span_minutes)
            .field("two_factor_token_ttl_seconds", &self.two_factor_token_ttl_seconds)
            .finish()
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            symmetric_signing_key: None,
            token_expiration_minutes: default_token_expiration_minutes(),
            token_issuer: String::new(),
            application_name: None,
            symmetric_algorithm: default_symmetric_algorithm(),
            asymmetric_algorithm: default_asymmetric_algorithm(),
            current_asymmetric_key_pair: None,
            legacy_asymmetric_key_pairs: Vec::new(),
            refresh_tokens_enabled: default_refresh_tokens_enabled(),
            refresh_token_update_policy: None,
            refresh_token_time_span_minutes: default_refresh_token_time_span_minutes(),
            two_factor_token_ttl_seconds: default_two_factor_token_ttl_seconds(),
        }
    }
}

impl JwtSettings {
    /// Create settings with an issuer and defaults for everything else
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            token_issuer: issuer.into(),
            ..Default::default()
        }
    }

    /// Sign with a symmetric key
    pub fn with_symmetric_key(mut self, key: impl Into<String>) -> Self {
        self.symmetric_signing_key = Some(key.into());
        self
    }

    /// Sign with an asymmetric key pair
    pub fn with_current_key_pair(mut self, pair: KeyPairSettings) -> Self {
        self.current_asymmetric_key_pair = Some(pair);
        self
    }

    /// Accept a retired key pair for validation
    pub fn with_legacy_key_pair(mut self, pair: KeyPairSettings) -> Self {
        self.legacy_asymmetric_key_pairs.push(pair);
        self
    }

    /// Set the rotation policy by name
    pub fn with_refresh_policy(mut self, policy: impl Into<String>) -> Self {
        self.refresh_token_update_policy = Some(policy.into());
        self
    }

    /// Set refresh token lifetime in days
    pub fn with_refresh_time_span_days(mut self, days: i64) -> Self {
        self.refresh_token_time_span_minutes = days * 24 * 60;
        self
    }

    /// Move the current key pair to the front of the legacy list and install `next`
    ///
    /// Tokens signed with the previous key keep validating until the legacy
    /// entry is removed from configuration.
    pub fn rotate_key_pair(mut self, next: KeyPairSettings) -> Self {
        if let Some(previous) = self.current_asymmetric_key_pair.replace(next) {
            self.legacy_asymmetric_key_pairs.insert(0, previous);
        }
        self
    }

    /// Whether a non-empty symmetric key is configured
    pub fn uses_symmetric_key(&self) -> bool {
        self.symmetric_signing_key
            .as_deref()
            .map(|key| !key.is_empty())
            .unwrap_or(false)
    }

    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    ///
    /// Key pairs are read from the files named by `JWT_PUBLIC_KEY_PATH` /
    /// `JWT_PRIVATE_KEY_PATH`; legacy pairs come from `JWT_LEGACY_KEY_PATHS`
    /// as a comma separated list of `public:private` path pairs.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_issuer = lookup("JWT_TOKEN_ISSUER")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                name: "JWT_TOKEN_ISSUER".to_string(),
            })?;

        let format = match lookup("JWT_KEY_FORMAT") {
            Some(value) => value.parse()?,
            None => KeyFormat::default(),
        };

        let current_asymmetric_key_pair =
            match (lookup("JWT_PUBLIC_KEY_PATH"), lookup("JWT_PRIVATE_KEY_PATH")) {
                (Some(public), Some(private)) => {
                    Some(KeyPairSettings::from_files(format, public, private)?)
                }
                (None, None) => None,
                (Some(_), None) => {
                    return Err(ConfigError::Missing {
                        name: "JWT_PRIVATE_KEY_PATH".to_string(),
                    })
                }
                (None, Some(_)) => {
                    return Err(ConfigError::Missing {
                        name: "JWT_PUBLIC_KEY_PATH".to_string(),
                    })
                }
            };

        let mut legacy_asymmetric_key_pairs = Vec::new();
        if let Some(paths) = lookup("JWT_LEGACY_KEY_PATHS") {
            for entry in paths.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let (public, private) =
                    entry.split_once(':').ok_or_else(|| ConfigError::InvalidValue {
                        name: "JWT_LEGACY_KEY_PATHS".to_string(),
                        value: entry.to_string(),
                    })?;
                legacy_asymmetric_key_pairs
                    .push(KeyPairSettings::from_files(format, public, private)?);
            }
        }

        Ok(Self {
            symmetric_signing_key: lookup("JWT_SYMMETRIC_SIGNING_KEY"),
            token_expiration_minutes: parse_or(
                &lookup,
                "JWT_TOKEN_EXPIRATION_MINUTES",
                default_token_expiration_minutes(),
            )?,
            token_issuer,
            application_name: lookup("JWT_APPLICATION_NAME"),
            symmetric_algorithm: lookup("JWT_SYMMETRIC_ALGORITHM")
                .unwrap_or_else(default_symmetric_algorithm),
            asymmetric_algorithm: lookup("JWT_ASYMMETRIC_ALGORITHM")
                .unwrap_or_else(default_asymmetric_algorithm),
            current_asymmetric_key_pair,
            legacy_asymmetric_key_pairs,
            refresh_tokens_enabled: parse_or(
                &lookup,
                "JWT_REFRESH_TOKENS_ENABLED",
                default_refresh_tokens_enabled(),
            )?,
            refresh_token_update_policy: lookup("JWT_REFRESH_TOKEN_UPDATE_POLICY"),
            refresh_token_time_span_minutes: parse_or(
                &lookup,
                "JWT_REFRESH_TOKEN_TIME_SPAN_MINUTES",
                default_refresh_token_time_span_minutes(),
            )?,
            two_factor_token_ttl_seconds: parse_or(
                &lookup,
                "JWT_TWO_FACTOR_TOKEN_TTL_SECONDS",
                default_two_factor_token_ttl_seconds(),
            )?,
        })
    }
}

fn read_key_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
        path: path.display().to_string(),
        source,
    })
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn default_token_expiration_minutes() -> i64 {
    60
}

fn default_symmetric_algorithm() -> String {
    String::from("HS256")
}

fn default_asymmetric_algorithm() -> String {
    String::from("RS256")
}

fn default_refresh_tokens_enabled() -> bool {
    true
}

fn default_refresh_token_time_span_minutes() -> i64 {
    30 * 24 * 60 // 30 days
}

fn default_two_factor_token_ttl_seconds() -> u64 {
    300
}
