//! RSA key material parsing and conversion
//!
//! Keys may be configured as PEM (SPKI / PKCS#1 public, PKCS#8 / PKCS#1
//! private) or as `<RSAKeyValue>` XML documents with base64 element bodies.
//! This module turns either form into `rsa` key objects and back, and builds
//! the `jsonwebtoken` signing and verification keys from them.

use std::collections::HashMap;

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use once_cell::sync::Lazy;
use regex::Regex;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use idp_shared::KeyFormat;

use super::der;
use super::key_pair::AsymmetricKeyPair;
use crate::errors::KeyError;

/// Smallest RSA modulus accepted for signing keys
pub const MIN_RSA_KEY_BITS: usize = 2048;

static XML_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z]+)>\s*([A-Za-z0-9+/=\s]*?)\s*</([A-Za-z]+)>")
        .expect("static XML element pattern is valid")
});

/// Stateless helpers for RSA key material
pub struct KeyHelper;

impl KeyHelper {
    /// Parse a public key in the given format
    pub fn parse_public_key(material: &str, format: KeyFormat) -> Result<RsaPublicKey, KeyError> {
        match format {
            KeyFormat::Pem => Self::parse_public_pem(material),
            KeyFormat::Xml => Self::parse_public_xml(material),
        }
    }

    /// Parse a private key in the given format
    pub fn parse_private_key(material: &str, format: KeyFormat) -> Result<RsaPrivateKey, KeyError> {
        match format {
            KeyFormat::Pem => Self::parse_private_pem(material),
            KeyFormat::Xml => Self::parse_private_xml(material),
        }
    }

    /// Parse a `PUBLIC KEY` (SPKI) or `RSA PUBLIC KEY` (PKCS#1) PEM block
    pub fn parse_public_pem(pem: &str) -> Result<RsaPublicKey, KeyError> {
        let pem = non_empty(pem, "public")?;
        RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| KeyError::InvalidPem {
                part: "public",
                message: e.to_string(),
            })
    }

    /// Parse a `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1) PEM block
    pub fn parse_private_pem(pem: &str) -> Result<RsaPrivateKey, KeyError> {
        let pem = non_empty(pem, "private")?;
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| KeyError::InvalidPem {
                part: "private",
                message: e.to_string(),
            })
    }

    /// Parse an `<RSAKeyValue>` document holding `Modulus` and `Exponent`
    pub fn parse_public_xml(xml: &str) -> Result<RsaPublicKey, KeyError> {
        let xml = non_empty(xml, "public")?;
        let elements = xml_elements(xml, "public")?;
        let n = xml_integer(&elements, "Modulus", "public")?;
        let e = xml_integer(&elements, "Exponent", "public")?;

        RsaPublicKey::new(n, e).map_err(|e| KeyError::InvalidXml {
            part: "public",
            message: e.to_string(),
        })
    }

    /// Parse an `<RSAKeyValue>` document holding the private components
    ///
    /// `Modulus`, `Exponent`, `D`, `P` and `Q` are required; the CRT values
    /// are recomputed rather than trusted.
    pub fn parse_private_xml(xml: &str) -> Result<RsaPrivateKey, KeyError> {
        let xml = non_empty(xml, "private")?;
        let elements = xml_elements(xml, "private")?;
        let n = xml_integer(&elements, "Modulus", "private")?;
        let e = xml_integer(&elements, "Exponent", "private")?;
        let d = xml_integer(&elements, "D", "private")?;
        let p = xml_integer(&elements, "P", "private")?;
        let q = xml_integer(&elements, "Q", "private")?;

        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q]).map_err(|e| {
            KeyError::InvalidXml {
                part: "private",
                message: e.to_string(),
            }
        })?;
        key.validate().map_err(|e| KeyError::InvalidXml {
            part: "private",
            message: e.to_string(),
        })?;
        Ok(key)
    }

    /// Render a public key as an SPKI PEM block
    pub fn public_key_to_pem(key: &RsaPublicKey) -> String {
        der::rsa_public_key_pem(&key.n().to_bytes_be(), &key.e().to_bytes_be())
    }

    /// Render a private key as a PKCS#8 PEM block
    pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<String, KeyError> {
        key.to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.as_str().to_owned())
            .map_err(|e| KeyError::Encoding {
                message: format!("private key PEM export failed: {e}"),
            })
    }

    /// Render a public key as an `<RSAKeyValue>` document
    pub fn public_key_to_xml(key: &RsaPublicKey) -> String {
        format!(
            "<RSAKeyValue><Modulus>{}</Modulus><Exponent>{}</Exponent></RSAKeyValue>",
            b64(key.n()),
            b64(key.e()),
        )
    }

    /// Render a private key as an `<RSAKeyValue>` document including CRT values
    pub fn private_key_to_xml(key: &RsaPrivateKey) -> Result<String, KeyError> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(KeyError::Encoding {
                message: format!("XML export needs exactly two primes, key has {}", primes.len()),
            });
        }
        let (p, q) = (&primes[0], &primes[1]);
        let one = BigUint::from(1u8);
        let two = BigUint::from(2u8);
        let dp = key.d() % (p - &one);
        let dq = key.d() % (q - &one);
        // p is prime, so q^(p-2) mod p is the inverse of q
        let inverse_q = q.modpow(&(p - &two), p);

        Ok(format!(
            "<RSAKeyValue><Modulus>{}</Modulus><Exponent>{}</Exponent><P>{}</P><Q>{}</Q>\
             <DP>{}</DP><DQ>{}</DQ><InverseQ>{}</InverseQ><D>{}</D></RSAKeyValue>",
            b64(key.n()),
            b64(key.e()),
            b64(p),
            b64(q),
            b64(&dp),
            b64(&dq),
            b64(&inverse_q),
            b64(key.d()),
        ))
    }

    /// Generate a fresh RSA private key for rotation tooling
    pub fn generate_private_key(bits: usize) -> Result<RsaPrivateKey, KeyError> {
        if bits < MIN_RSA_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                min: MIN_RSA_KEY_BITS,
            });
        }
        let mut rng = rand::rngs::OsRng;
        RsaPrivateKey::new(&mut rng, bits).map_err(|e| KeyError::Encoding {
            message: format!("RSA key generation failed: {e}"),
        })
    }

    /// Generate a key pair rendered in the requested format
    pub fn generate_key_pair(bits: usize, format: KeyFormat) -> Result<AsymmetricKeyPair, KeyError> {
        let private_key = Self::generate_private_key(bits)?;
        AsymmetricKeyPair::from_parts(format, private_key)
    }

    /// Re-render a key pair as PEM; PEM pairs are returned unchanged
    pub fn to_pem_pair(pair: &AsymmetricKeyPair) -> Result<AsymmetricKeyPair, KeyError> {
        match pair.format() {
            KeyFormat::Pem => Ok(pair.clone()),
            KeyFormat::Xml => AsymmetricKeyPair::from_parts(KeyFormat::Pem, pair.private_key().clone()),
        }
    }

    /// Re-render a key pair as XML; XML pairs are returned unchanged
    pub fn to_xml_pair(pair: &AsymmetricKeyPair) -> Result<AsymmetricKeyPair, KeyError> {
        match pair.format() {
            KeyFormat::Xml => Ok(pair.clone()),
            KeyFormat::Pem => AsymmetricKeyPair::from_parts(KeyFormat::Xml, pair.private_key().clone()),
        }
    }

    /// Fail when the modulus is shorter than [`MIN_RSA_KEY_BITS`]
    pub fn ensure_key_size(key: &RsaPublicKey) -> Result<(), KeyError> {
        let bits = key.n().bits();
        if bits < MIN_RSA_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                min: MIN_RSA_KEY_BITS,
            });
        }
        Ok(())
    }

    /// Unsigned big-endian modulus, base64url without padding
    pub fn modulus_b64url(key: &RsaPublicKey) -> String {
        URL_SAFE_NO_PAD.encode(key.n().to_bytes_be())
    }

    /// Unsigned big-endian exponent, base64url without padding
    pub fn exponent_b64url(key: &RsaPublicKey) -> String {
        URL_SAFE_NO_PAD.encode(key.e().to_bytes_be())
    }

    /// Build the `jsonwebtoken` signing key from an RSA private key
    pub fn encoding_key(key: &RsaPrivateKey) -> Result<EncodingKey, KeyError> {
        let der = key.to_pkcs1_der().map_err(|e| KeyError::Encoding {
            message: format!("PKCS#1 export failed: {e}"),
        })?;
        Ok(EncodingKey::from_rsa_der(der.as_bytes()))
    }

    /// Build the `jsonwebtoken` verification key from an RSA public key
    pub fn decoding_key(key: &RsaPublicKey) -> Result<DecodingKey, KeyError> {
        DecodingKey::from_rsa_components(&Self::modulus_b64url(key), &Self::exponent_b64url(key))
            .map_err(|e| KeyError::Encoding {
                message: format!("RSA verification key construction failed: {e}"),
            })
    }
}

fn non_empty<'a>(material: &'a str, part: &'static str) -> Result<&'a str, KeyError> {
    let trimmed = material.trim();
    if trimmed.is_empty() {
        return Err(KeyError::EmptyKeyMaterial { part });
    }
    Ok(trimmed)
}

fn xml_elements(xml: &str, part: &'static str) -> Result<HashMap<String, String>, KeyError> {
    if !xml.starts_with("<RSAKeyValue>") || !xml.ends_with("</RSAKeyValue>") {
        return Err(KeyError::InvalidXml {
            part,
            message: "document root must be <RSAKeyValue>".to_string(),
        });
    }

    let mut elements = HashMap::new();
    for captures in XML_ELEMENT.captures_iter(xml) {
        let open = &captures[1];
        if open != &captures[3] {
            return Err(KeyError::InvalidXml {
                part,
                message: format!("mismatched element <{}>", open),
            });
        }
        elements.insert(open.to_string(), captures[2].to_string());
    }
    Ok(elements)
}

fn xml_integer(
    elements: &HashMap<String, String>,
    name: &str,
    part: &'static str,
) -> Result<BigUint, KeyError> {
    let body = elements.get(name).ok_or_else(|| KeyError::InvalidXml {
        part,
        message: format!("missing <{}> element", name),
    })?;
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| KeyError::InvalidXml {
        part,
        message: format!("<{}> is not valid base64: {}", name, e),
    })?;
    if bytes.is_empty() {
        return Err(KeyError::InvalidXml {
            part,
            message: format!("<{}> is empty", name),
        });
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn b64(value: &BigUint) -> String {
    STANDARD.encode(value.to_bytes_be())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixtures::*;

    #[test]
    fn test_parse_pem_public_and_private() {
        let public = KeyHelper::parse_public_pem(PRIMARY_PUBLIC_PEM).unwrap();
        let private = KeyHelper::parse_private_pem(PRIMARY_PRIVATE_PEM).unwrap();
        assert_eq!(RsaPublicKey::from(&private), public);
    }

    #[test]
    fn test_parse_pkcs1_private_pem() {
        let private = KeyHelper::parse_private_pem(SECONDARY_PRIVATE_PEM).unwrap();
        let public = KeyHelper::parse_public_pem(SECONDARY_PUBLIC_PEM).unwrap();
        assert_eq!(RsaPublicKey::from(&private), public);
    }

    #[test]
    fn test_parse_xml_matches_pem() {
        let from_xml = KeyHelper::parse_public_xml(PRIMARY_PUBLIC_XML).unwrap();
        let from_pem = KeyHelper::parse_public_pem(PRIMARY_PUBLIC_PEM).unwrap();
        assert_eq!(from_xml, from_pem);

        let private = KeyHelper::parse_private_xml(PRIMARY_PRIVATE_XML).unwrap();
        assert_eq!(RsaPublicKey::from(&private), from_pem);
    }

    #[test]
    fn test_empty_material_is_rejected() {
        assert!(matches!(
            KeyHelper::parse_public_pem("   "),
            Err(KeyError::EmptyKeyMaterial { part: "public" })
        ));
        assert!(matches!(
            KeyHelper::parse_private_xml(""),
            Err(KeyError::EmptyKeyMaterial { part: "private" })
        ));
    }

    #[test]
    fn test_garbage_pem_is_rejected() {
        let result = KeyHelper::parse_public_pem("-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----");
        assert!(matches!(result, Err(KeyError::InvalidPem { .. })));
    }

    #[test]
    fn test_xml_requires_root_and_elements() {
        assert!(matches!(
            KeyHelper::parse_public_xml("<Key><Modulus>AQAB</Modulus></Key>"),
            Err(KeyError::InvalidXml { .. })
        ));
        assert!(matches!(
            KeyHelper::parse_public_xml("<RSAKeyValue><Modulus>AQAB</Modulus></RSAKeyValue>"),
            Err(KeyError::InvalidXml { .. })
        ));
        assert!(matches!(
            KeyHelper::parse_private_xml(PRIMARY_PUBLIC_XML),
            Err(KeyError::InvalidXml { .. })
        ));
    }

    #[test]
    fn test_public_key_pem_export_is_byte_exact() {
        let public = KeyHelper::parse_public_pem(PRIMARY_PUBLIC_PEM).unwrap();
        let exported = KeyHelper::public_key_to_pem(&public);
        assert_eq!(exported.trim_end(), PRIMARY_PUBLIC_PEM.trim_end());
    }

    #[test]
    fn test_spki_matches_standard_encoder() {
        use rsa::pkcs8::EncodePublicKey;

        let public = KeyHelper::parse_public_pem(SECONDARY_PUBLIC_PEM).unwrap();
        let standard = public.to_public_key_der().unwrap();
        let ours = der::rsa_subject_public_key_info(
            &public.n().to_bytes_be(),
            &public.e().to_bytes_be(),
        );
        assert_eq!(ours.as_slice(), standard.as_bytes());
    }

    #[test]
    fn test_xml_round_trip_through_conversion() {
        let private = KeyHelper::parse_private_pem(SECONDARY_PRIVATE_PEM).unwrap();
        let xml = KeyHelper::private_key_to_xml(&private).unwrap();
        let reparsed = KeyHelper::parse_private_xml(&xml).unwrap();
        assert_eq!(RsaPublicKey::from(&reparsed), RsaPublicKey::from(&private));

        let public_xml = KeyHelper::public_key_to_xml(&RsaPublicKey::from(&private));
        assert_eq!(
            KeyHelper::parse_public_xml(&public_xml).unwrap(),
            RsaPublicKey::from(&private)
        );
    }

    #[test]
    fn test_jwk_components_match_fixture() {
        let public = KeyHelper::parse_public_pem(PRIMARY_PUBLIC_PEM).unwrap();
        assert_eq!(KeyHelper::modulus_b64url(&public), PRIMARY_MODULUS_B64URL);
        assert_eq!(KeyHelper::exponent_b64url(&public), PRIMARY_EXPONENT_B64URL);
    }

    #[test]
    fn test_pair_conversion_keeps_key() {
        let xml = AsymmetricKeyPair::from_xml(SECONDARY_PUBLIC_XML, SECONDARY_PRIVATE_XML).unwrap();
        let pem = KeyHelper::to_pem_pair(&xml).unwrap();
        assert_eq!(pem.format(), KeyFormat::Pem);
        assert_eq!(pem.public_key_text().trim_end(), SECONDARY_PUBLIC_PEM.trim_end());
        assert_eq!(pem, xml);

        let back = KeyHelper::to_xml_pair(&pem).unwrap();
        assert_eq!(back.format(), KeyFormat::Xml);
        let reparsed =
            AsymmetricKeyPair::from_xml(back.public_key_text(), back.private_key_text()).unwrap();
        assert_eq!(reparsed, xml);
    }

    #[test]
    fn test_generate_rejects_small_keys() {
        assert!(matches!(
            KeyHelper::generate_private_key(1024),
            Err(KeyError::KeyTooSmall { bits: 1024, min: 2048 })
        ));
    }

    #[test]
    fn test_generated_pair_is_usable_in_either_format() {
        let xml = KeyHelper::generate_key_pair(MIN_RSA_KEY_BITS, KeyFormat::Xml).unwrap();
        assert_eq!(xml.format(), KeyFormat::Xml);
        assert!(xml.public_key_text().starts_with("<RSAKeyValue>"));

        let reparsed = AsymmetricKeyPair::from_xml(xml.public_key_text(), xml.private_key_text()).unwrap();
        assert_eq!(reparsed, xml);

        let pem = KeyHelper::to_pem_pair(&xml).unwrap();
        assert_eq!(
            crate::crypto::KeyIdBuilder::from_key_pair(&pem),
            crate::crypto::KeyIdBuilder::from_key_pair(&xml)
        );
        assert!(matches!(
            KeyHelper::generate_key_pair(1024, KeyFormat::Pem),
            Err(KeyError::KeyTooSmall { .. })
        ));
    }
}
