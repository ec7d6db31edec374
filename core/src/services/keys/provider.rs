//! Signing and validation key resolution

use std::sync::Arc;

use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use idp_shared::JwtSettings;

use super::config::{SigningConfiguration, SigningMode};
use crate::crypto::{AsymmetricKeyPair, KeyHelper, KeyId, KeyIdBuilder};
use crate::errors::{DomainError, KeyError};

/// Key used to sign new tokens
#[derive(Clone)]
pub struct SigningKey {
    pub encoding_key: EncodingKey,
    pub algorithm: Algorithm,
    /// Set in asymmetric mode and written to the token header
    pub kid: Option<KeyId>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish()
    }
}

/// Key accepted when validating tokens
#[derive(Clone)]
pub struct ValidationKey {
    pub decoding_key: DecodingKey,
    pub algorithm: Algorithm,
    pub kid: Option<KeyId>,
}

impl std::fmt::Debug for ValidationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationKey")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish()
    }
}

/// Resolves the keys for signing, validation and export
///
/// Key material is parsed once, at construction. Only the current key pair
/// ever signs; legacy pairs are accepted for validation until they are
/// removed from configuration.
pub struct KeyProvider {
    config: Arc<SigningConfiguration>,
    signing_key: SigningKey,
    validation_keys: Vec<ValidationKey>,
    key_ids: DashMap<String, KeyId>,
}

impl std::fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyProvider")
            .field("mode", &self.config.mode)
            .field("signing_key", &self.signing_key)
            .field("validation_keys", &self.validation_keys.len())
            .finish()
    }
}

impl KeyProvider {
    /// Create a provider over a validated configuration
    pub fn new(config: Arc<SigningConfiguration>) -> Result<Self, KeyError> {
        let key_ids = DashMap::new();

        let (signing_key, validation_keys) = match &config.mode {
            SigningMode::Symmetric { key } => {
                let algorithm = config.symmetric_algorithm;
                let signing_key = SigningKey {
                    encoding_key: EncodingKey::from_secret(key.as_bytes()),
                    algorithm,
                    kid: None,
                };
                let validation_key = ValidationKey {
                    decoding_key: DecodingKey::from_secret(key.as_bytes()),
                    algorithm,
                    kid: None,
                };
                (signing_key, vec![validation_key])
            }
            SigningMode::Asymmetric { current, legacy } => {
                let algorithm = config.asymmetric_algorithm;
                let signing_key = SigningKey {
                    encoding_key: KeyHelper::encoding_key(current.private_key())?,
                    algorithm,
                    kid: Some(cached_key_id(&key_ids, current)),
                };

                let mut validation_keys = Vec::with_capacity(1 + legacy.len());
                for pair in std::iter::once(current).chain(legacy.iter()) {
                    validation_keys.push(ValidationKey {
                        decoding_key: KeyHelper::decoding_key(pair.public_key())?,
                        algorithm,
                        kid: Some(cached_key_id(&key_ids, pair)),
                    });
                }
                (signing_key, validation_keys)
            }
        };

        tracing::info!(
            symmetric = config.is_symmetric(),
            algorithm = ?signing_key.algorithm,
            kid = signing_key.kid.as_ref().map(KeyId::as_str),
            validation_keys = validation_keys.len(),
            "Key provider initialized"
        );

        Ok(Self {
            config,
            signing_key,
            validation_keys,
            key_ids,
        })
    }

    /// Validate settings and build a provider, failing fast on bad setup
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, DomainError> {
        let config = SigningConfiguration::from_settings(settings)?;
        Ok(Self::new(Arc::new(config))?)
    }

    pub fn configuration(&self) -> &SigningConfiguration {
        &self.config
    }

    pub fn shared_configuration(&self) -> Arc<SigningConfiguration> {
        Arc::clone(&self.config)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Current key first, then legacy keys in configured order
    pub fn validation_keys(&self) -> &[ValidationKey] {
        &self.validation_keys
    }

    /// Validation key whose id equals `kid`
    pub fn key_for_kid(&self, kid: &str) -> Option<&ValidationKey> {
        self.validation_keys
            .iter()
            .find(|key| key.kid.as_ref().map(KeyId::as_str) == Some(kid))
    }

    /// HMAC secret in symmetric mode
    pub fn symmetric_key(&self) -> Option<&str> {
        match &self.config.mode {
            SigningMode::Symmetric { key } => Some(key),
            SigningMode::Asymmetric { .. } => None,
        }
    }

    pub fn current_key_pair(&self) -> Option<&AsymmetricKeyPair> {
        match &self.config.mode {
            SigningMode::Symmetric { .. } => None,
            SigningMode::Asymmetric { current, .. } => Some(current),
        }
    }

    /// Current then legacy pairs; empty in symmetric mode
    pub fn asymmetric_key_pairs(&self) -> Vec<&AsymmetricKeyPair> {
        match &self.config.mode {
            SigningMode::Symmetric { .. } => Vec::new(),
            SigningMode::Asymmetric { current, legacy } => {
                std::iter::once(current).chain(legacy.iter()).collect()
            }
        }
    }

    /// Key id of a pair, cached by its public key text
    pub fn key_id(&self, pair: &AsymmetricKeyPair) -> KeyId {
        cached_key_id(&self.key_ids, pair)
    }

    /// Number of distinct public keys with a cached id
    pub fn cached_key_ids(&self) -> usize {
        self.key_ids.len()
    }
}

fn cached_key_id(cache: &DashMap<String, KeyId>, pair: &AsymmetricKeyPair) -> KeyId {
    if let Some(kid) = cache.get(pair.public_key_text()) {
        return kid.clone();
    }
    cache
        .entry(pair.public_key_text().to_string())
        .or_insert_with(|| KeyIdBuilder::from_key_pair(pair))
        .clone()
}
