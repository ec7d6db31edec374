//! Domain-specific error types and error handling.

mod types;

pub use types::{KeyError, SetupError, TokenError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    // Bridge to specific error types
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_errors_convert_into_domain_error() {
        let err: DomainError = SetupError::MissingAsymmetricKeyPair.into();
        assert!(matches!(err, DomainError::Setup(SetupError::MissingAsymmetricKeyPair)));
        assert_eq!(
            err.to_string(),
            "Asymmetric signing is selected but no current asymmetric key pair is configured"
        );

        let err: DomainError = KeyError::EmptyKeyMaterial { part: "public" }.into();
        assert_eq!(err.to_string(), "Empty public key material");
    }

    #[test]
    fn test_invalid_key_pair_keeps_source() {
        use std::error::Error as _;

        let err = SetupError::InvalidKeyPair {
            slot: "legacy[0]".to_string(),
            source: KeyError::MismatchedKeyPair,
        };
        assert!(err.to_string().starts_with("Invalid legacy[0] key pair"));
        assert!(err.source().is_some());
    }
}
