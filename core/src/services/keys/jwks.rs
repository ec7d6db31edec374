//! JSON Web Key Set export
//!
//! Publishes the current and legacy RSA public keys so external verifiers can
//! select a key by the `kid` in a token header, and renders the current key
//! as a standalone PEM block.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::provider::KeyProvider;
use crate::crypto::{der, KeyHelper};
use crate::errors::DomainError;

/// JWK (JSON Web Key) entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type, always "RSA"
    pub kty: String,
    /// Public key use, always "sig"
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signing algorithm
    pub alg: String,
    /// Modulus, base64url
    pub n: String,
    /// Exponent, base64url
    pub e: String,
    /// Key id
    pub kid: String,
}

/// JWKS (JSON Web Key Set) document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// Renders the provider's asymmetric keys for publication
pub struct JwksExporter {
    keys: Arc<KeyProvider>,
}

impl JwksExporter {
    pub fn new(keys: Arc<KeyProvider>) -> Self {
        Self { keys }
    }

    /// One entry per current and legacy key; empty in symmetric mode
    pub fn jwks(&self) -> JsonWebKeySet {
        let alg = format!("{:?}", self.keys.configuration().asymmetric_algorithm);
        let keys = self
            .keys
            .asymmetric_key_pairs()
            .into_iter()
            .map(|pair| JsonWebKey {
                kty: "RSA".to_string(),
                key_use: "sig".to_string(),
                alg: alg.clone(),
                n: KeyHelper::modulus_b64url(pair.public_key()),
                e: KeyHelper::exponent_b64url(pair.public_key()),
                kid: self.keys.key_id(pair).into_inner(),
            })
            .collect();

        JsonWebKeySet { keys }
    }

    /// The key set as a JSON string
    pub fn jwks_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(&self.jwks()).map_err(|e| DomainError::Internal {
            message: format!("Failed to serialize JWKS: {}", e),
        })
    }

    /// Current public key as a `PUBLIC KEY` PEM block; `None` in symmetric mode
    pub fn current_public_key_pem(&self) -> Option<String> {
        use rsa::traits::PublicKeyParts;

        self.keys.current_key_pair().map(|pair| {
            let key = pair.public_key();
            der::rsa_public_key_pem(&key.n().to_bytes_be(), &key.e().to_bytes_be())
        })
    }
}
