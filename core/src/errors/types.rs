//! Error types for setup, key material and token operations

use thiserror::Error;

/// Fatal configuration errors raised while the engine is being assembled
///
/// These abort startup; none of them is ever defaulted away.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Token issuer is not configured")]
    MissingIssuer,

    #[error("Asymmetric signing is selected but no current asymmetric key pair is configured")]
    MissingAsymmetricKeyPair,

    #[error("Symmetric signing key is too short (minimum {min} characters, got {actual})")]
    SymmetricKeyTooShort { min: usize, actual: usize },

    #[error("Unsupported signing algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Algorithm {algorithm} cannot be used for {mode} signing")]
    AlgorithmMismatch {
        algorithm: String,
        mode: &'static str,
    },

    #[error("Invalid {name}: {value}")]
    InvalidLifetime { name: &'static str, value: i64 },

    #[error("Invalid {slot} key pair: {source}")]
    InvalidKeyPair {
        slot: String,
        #[source]
        source: KeyError,
    },
}

/// Errors raised while parsing, validating or encoding key material
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Empty {part} key material")]
    EmptyKeyMaterial { part: &'static str },

    #[error("Invalid PEM {part} key: {message}")]
    InvalidPem { part: &'static str, message: String },

    #[error("Invalid XML {part} key: {message}")]
    InvalidXml { part: &'static str, message: String },

    #[error("Public key does not belong to the private key")]
    MismatchedKeyPair,

    #[error("RSA key of {bits} bits is below the minimum of {min} bits")]
    KeyTooSmall { bits: usize, min: usize },

    #[error("Key encoding failed: {message}")]
    Encoding { message: String },
}

/// Errors raised while building tokens
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token signing failed: {message}")]
    SigningFailed { message: String },

    #[error("Invalid token claims: {message}")]
    InvalidClaims { message: String },

    #[error("Two-factor placeholder token is invalid or expired")]
    InvalidTwoFactorToken,
}
