//! Validated asymmetric key pairs

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use idp_shared::{KeyFormat, KeyPairSettings};

use super::key_helper::KeyHelper;
use crate::errors::KeyError;

/// An RSA key pair together with the text it was configured from
///
/// The only way to obtain one is through a validating constructor: both
/// halves must parse and the public key must belong to the private key.
/// The configured text is kept verbatim because it is the cache key for
/// key-id lookups and the authoritative representation for this entry.
#[derive(Clone)]
pub struct AsymmetricKeyPair {
    format: KeyFormat,
    public_key_text: String,
    private_key_text: String,
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for AsymmetricKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsymmetricKeyPair")
            .field("format", &self.format)
            .field("bits", &self.key_size_bits())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl PartialEq for AsymmetricKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl AsymmetricKeyPair {
    /// Build a pair from key material in the given format
    ///
    /// # Errors
    ///
    /// * `KeyError::EmptyKeyMaterial` - either half is blank
    /// * `KeyError::InvalidPem` / `KeyError::InvalidXml` - either half does not parse
    /// * `KeyError::MismatchedKeyPair` - the halves belong to different keys
    /// * `KeyError::KeyTooSmall` - modulus below 2048 bits
    pub fn new(
        format: KeyFormat,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let public_key_text = public_key.into();
        let private_key_text = private_key.into();

        let public_key = KeyHelper::parse_public_key(&public_key_text, format)?;
        let private_key = KeyHelper::parse_private_key(&private_key_text, format)?;

        if RsaPublicKey::from(&private_key) != public_key {
            return Err(KeyError::MismatchedKeyPair);
        }
        KeyHelper::ensure_key_size(&public_key)?;

        Ok(Self {
            format,
            public_key_text,
            private_key_text,
            public_key,
            private_key,
        })
    }

    /// Build a pair from PEM blocks
    pub fn from_pem(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, KeyError> {
        Self::new(KeyFormat::Pem, public_key, private_key)
    }

    /// Build a pair from `<RSAKeyValue>` documents
    pub fn from_xml(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, KeyError> {
        Self::new(KeyFormat::Xml, public_key, private_key)
    }

    /// Build a pair from configured settings
    pub fn from_settings(settings: &KeyPairSettings) -> Result<Self, KeyError> {
        Self::new(
            settings.format,
            settings.public_key.clone(),
            settings.private_key.clone(),
        )
    }

    pub(crate) fn from_parts(format: KeyFormat, private_key: RsaPrivateKey) -> Result<Self, KeyError> {
        let public_key = RsaPublicKey::from(&private_key);
        let (public_key_text, private_key_text) = match format {
            KeyFormat::Pem => (
                KeyHelper::public_key_to_pem(&public_key),
                KeyHelper::private_key_to_pem(&private_key)?,
            ),
            KeyFormat::Xml => (
                KeyHelper::public_key_to_xml(&public_key),
                KeyHelper::private_key_to_xml(&private_key)?,
            ),
        };
        Ok(Self {
            format,
            public_key_text,
            private_key_text,
            public_key,
            private_key,
        })
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// Public key exactly as configured
    pub fn public_key_text(&self) -> &str {
        &self.public_key_text
    }

    /// Private key exactly as configured
    pub fn private_key_text(&self) -> &str {
        &self.private_key_text
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Modulus length in bits
    pub fn key_size_bits(&self) -> usize {
        self.public_key.n().bits()
    }

    /// Settings form of this pair, for writing rotated keys back to configuration
    pub fn to_settings(&self) -> KeyPairSettings {
        KeyPairSettings {
            format: self.format,
            public_key: self.public_key_text.clone(),
            private_key: self.private_key_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixtures::*;

    #[test]
    fn test_from_pem_accepts_matching_pair() {
        let pair = AsymmetricKeyPair::from_pem(PRIMARY_PUBLIC_PEM, PRIMARY_PRIVATE_PEM).unwrap();
        assert_eq!(pair.format(), KeyFormat::Pem);
        assert_eq!(pair.key_size_bits(), 2048);
        assert_eq!(pair.public_key_text(), PRIMARY_PUBLIC_PEM);
    }

    #[test]
    fn test_from_xml_accepts_matching_pair() {
        let pair = AsymmetricKeyPair::from_xml(PRIMARY_PUBLIC_XML, PRIMARY_PRIVATE_XML).unwrap();
        let pem = AsymmetricKeyPair::from_pem(PRIMARY_PUBLIC_PEM, PRIMARY_PRIVATE_PEM).unwrap();
        assert_eq!(pair, pem);
    }

    #[test]
    fn test_mismatched_halves_are_rejected() {
        let result = AsymmetricKeyPair::from_pem(PRIMARY_PUBLIC_PEM, SECONDARY_PRIVATE_PEM);
        assert!(matches!(result, Err(KeyError::MismatchedKeyPair)));
    }

    #[test]
    fn test_empty_material_is_rejected() {
        assert!(matches!(
            AsymmetricKeyPair::from_pem("", PRIMARY_PRIVATE_PEM),
            Err(KeyError::EmptyKeyMaterial { part: "public" })
        ));
        assert!(matches!(
            AsymmetricKeyPair::from_pem(PRIMARY_PUBLIC_PEM, "\n"),
            Err(KeyError::EmptyKeyMaterial { part: "private" })
        ));
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let result = AsymmetricKeyPair::from_xml(PRIMARY_PUBLIC_PEM, PRIMARY_PRIVATE_PEM);
        assert!(matches!(result, Err(KeyError::InvalidXml { .. })));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let pair = AsymmetricKeyPair::from_pem(PRIMARY_PUBLIC_PEM, PRIMARY_PRIVATE_PEM).unwrap();
        let rendered = format!("{:?}", pair);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("PRIVATE KEY"));
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = KeyPairSettings::pem(SECONDARY_PUBLIC_PEM, SECONDARY_PRIVATE_PEM);
        let pair = AsymmetricKeyPair::from_settings(&settings).unwrap();
        let back = pair.to_settings();
        assert_eq!(back.public_key, SECONDARY_PUBLIC_PEM);
        assert_eq!(back.format, KeyFormat::Pem);
    }
}
