//! JWT construction and signing

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Header};

use super::claims::RegisteredClaimsAdder;
use crate::domain::entities::user::TokenSubject;
use crate::domain::value_objects::claims::{names, ClaimSet};
use crate::errors::{DomainError, TokenError};
use crate::services::keys::KeyProvider;

/// A signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltToken {
    /// Compact JWS
    pub token: String,
    /// `exp` claim (unix seconds)
    pub expires_at: i64,
    /// `jti` claim
    pub jti: String,
}

/// Signs tokens with the provider's current signing key
pub struct JwtBuilder {
    keys: Arc<KeyProvider>,
}

impl JwtBuilder {
    pub fn new(keys: Arc<KeyProvider>) -> Self {
        Self { keys }
    }

    /// Restricted token issued before the second factor is verified
    ///
    /// Carries only the registered claims plus `two_factor_required` and
    /// `two_factor_provider`.
    pub fn build_two_factor_required<U: TokenSubject>(&self, user: &U) -> Result<BuiltToken, DomainError> {
        let mut claims = ClaimSet::new();
        claims.insert(names::SUBJECT, user.id().to_string());
        claims.insert(names::TWO_FACTOR_REQUIRED, true);
        if let Some(provider) = user.two_factor_provider() {
            claims.insert(names::TWO_FACTOR_PROVIDER, provider);
        }
        self.sign(user, claims)
    }

    /// Full token carrying the assembled claims
    pub fn build_full<U: TokenSubject>(&self, user: &U, claims: ClaimSet) -> Result<BuiltToken, DomainError> {
        self.sign(user, claims)
    }

    fn sign<U: TokenSubject>(&self, user: &U, mut claims: ClaimSet) -> Result<BuiltToken, DomainError> {
        let config = self.keys.configuration();
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(config.token_lifetime)
            .ok_or_else(|| TokenError::InvalidClaims {
                message: "token expiry is out of range".to_string(),
            })?
            .timestamp();

        RegisteredClaimsAdder::add(&mut claims, user.id(), &config.issuer, now);
        claims.insert(names::AUDIENCE, config.audience.clone());
        claims.insert(names::NOT_BEFORE, now.timestamp());
        claims.insert(names::EXPIRES, expires_at);

        let jti = claims
            .get_str(names::JWT_ID)
            .map(str::to_string)
            .ok_or_else(|| TokenError::InvalidClaims {
                message: "jti must be a string".to_string(),
            })?;

        let signing_key = self.keys.signing_key();
        let mut header = Header::new(signing_key.algorithm);
        header.kid = signing_key.kid.as_ref().map(|kid| kid.to_string());

        let token = encode(&header, &claims, &signing_key.encoding_key).map_err(|e| {
            TokenError::SigningFailed {
                message: e.to_string(),
            }
        })?;

        tracing::debug!(
            user_id = %user.id(),
            kid = header.kid.as_deref(),
            expires_at,
            "Signed access token"
        );

        Ok(BuiltToken {
            token,
            expires_at,
            jti,
        })
    }
}
