//! Deterministic key identifiers

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use idp_shared::KeyFormat;

use super::der;
use super::key_helper::KeyHelper;
use super::key_pair::AsymmetricKeyPair;
use crate::errors::KeyError;

/// Identifier of a public key, carried as `kid` in token headers and JWKS entries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives [`KeyId`]s from public keys
///
/// The id is `base64url(SHA-256(DER SubjectPublicKeyInfo))` with no padding.
/// It depends only on the modulus and exponent, so the PEM and XML forms of
/// one key produce the same id on every host and across restarts.
pub struct KeyIdBuilder;

impl KeyIdBuilder {
    pub fn from_public_key(key: &RsaPublicKey) -> KeyId {
        let spki = der::rsa_subject_public_key_info(&key.n().to_bytes_be(), &key.e().to_bytes_be());
        let digest = Sha256::digest(&spki);
        KeyId(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Parse public key text and derive its id
    pub fn from_public_key_text(text: &str, format: KeyFormat) -> Result<KeyId, KeyError> {
        let key = KeyHelper::parse_public_key(text, format)?;
        Ok(Self::from_public_key(&key))
    }

    pub fn from_key_pair(pair: &AsymmetricKeyPair) -> KeyId {
        Self::from_public_key(pair.public_key())
    }
}
