//! Inbound token validation

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Header, Validation};
use thiserror::Error;

use crate::domain::value_objects::claims::{names, ClaimSet};
use crate::services::keys::{KeyProvider, ValidationKey};

/// A token whose signature and issuer were accepted
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: ClaimSet,
}

impl DecodedToken {
    pub fn subject(&self) -> Option<&str> {
        self.claims.get_str(names::SUBJECT)
    }
}

/// Why a readable token was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTokenReason {
    #[error("signature does not match any validation key")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("unexpected issuer")]
    InvalidIssuer,

    #[error("algorithm is not accepted")]
    AlgorithmNotAccepted,

    #[error("missing required claim {0}")]
    MissingClaim(String),

    #[error("{0}")]
    Other(String),
}

impl From<&jsonwebtoken::errors::Error> for InvalidTokenReason {
    fn from(error: &jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => InvalidTokenReason::InvalidSignature,
            ErrorKind::ExpiredSignature => InvalidTokenReason::Expired,
            ErrorKind::ImmatureSignature => InvalidTokenReason::NotYetValid,
            ErrorKind::InvalidIssuer => InvalidTokenReason::InvalidIssuer,
            ErrorKind::InvalidAlgorithm => InvalidTokenReason::AlgorithmNotAccepted,
            ErrorKind::MissingRequiredClaim(claim) => InvalidTokenReason::MissingClaim(claim.clone()),
            _ => InvalidTokenReason::Other(error.to_string()),
        }
    }
}

impl InvalidTokenReason {
    /// The failure came from a key that does not match, so another key may still succeed
    fn is_key_mismatch(&self) -> bool {
        matches!(
            self,
            InvalidTokenReason::InvalidSignature | InvalidTokenReason::AlgorithmNotAccepted
        )
    }
}

/// Result of validating a token
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// Signature and issuer accepted
    Valid(DecodedToken),
    /// Not a JWS with a decodable header and claims payload
    Unreadable,
    /// Readable but rejected
    Invalid(InvalidTokenReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn into_decoded(self) -> Option<DecodedToken> {
        match self {
            ValidationOutcome::Valid(decoded) => Some(decoded),
            _ => None,
        }
    }
}

/// Whether a payload segment is base64url JSON claims
fn payload_is_readable(segment: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(segment)
        .ok()
        .is_some_and(|bytes| serde_json::from_slice::<ClaimSet>(&bytes).is_ok())
}

/// Verifies tokens against the provider's validation keys
///
/// Audience is not checked. Expiry and not-before are checked with the
/// library's default leeway.
pub struct JwtValidator {
    keys: Arc<KeyProvider>,
}

impl JwtValidator {
    pub fn new(keys: Arc<KeyProvider>) -> Self {
        Self { keys }
    }

    /// Validate a compact JWS
    ///
    /// The key named by the header `kid` is tried first, then every other
    /// validation key in order. Never fails for ordinary bad tokens.
    pub fn validate(&self, token: &str) -> ValidationOutcome {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || !payload_is_readable(segments[1]) {
            return ValidationOutcome::Unreadable;
        }
        let header = match decode_header(token) {
            Ok(header) => header,
            Err(_) => return ValidationOutcome::Unreadable,
        };

        let preferred = header.kid.as_deref().and_then(|kid| self.keys.key_for_kid(kid));
        let candidates = preferred.into_iter().chain(
            self.keys
                .validation_keys()
                .iter()
                .filter(move |key| !preferred.is_some_and(|p| std::ptr::eq(*key, p))),
        );

        let mut failure = InvalidTokenReason::InvalidSignature;
        for key in candidates {
            match self.try_key(token, key) {
                Ok(claims) => {
                    return ValidationOutcome::Valid(DecodedToken { header, claims });
                }
                Err(reason) if reason.is_key_mismatch() => {
                    failure = reason;
                }
                Err(reason) => {
                    failure = reason;
                    break;
                }
            }
        }

        tracing::warn!(kid = header.kid.as_deref(), reason = %failure, "Rejected token");
        ValidationOutcome::Invalid(failure)
    }

    fn try_key(&self, token: &str, key: &ValidationKey) -> Result<ClaimSet, InvalidTokenReason> {
        let mut validation = Validation::new(key.algorithm);
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.keys.configuration().issuer.as_str()]);

        decode::<ClaimSet>(token, &key.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| InvalidTokenReason::from(&e))
    }
}
