//! Refresh token lifecycle

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;
use crate::repositories::{RefreshTokenRepository, RefreshTokenSpec};
use crate::services::keys::SigningConfiguration;

/// Smallest number of random bytes in a payload
pub const MIN_PAYLOAD_BYTES: usize = 100;

/// Largest number of random bytes in a payload
pub const MAX_PAYLOAD_BYTES: usize = 120;

/// Service for issuing, rotating and revoking refresh tokens
///
/// Every write is staged on the repository and committed with
/// `save_changes` before the call returns.
pub struct RefreshTokenService<R: RefreshTokenRepository> {
    repository: Arc<R>,
    lifetime: Duration,
}

impl<R: RefreshTokenRepository> RefreshTokenService<R> {
    /// Creates a new refresh token service
    ///
    /// # Arguments
    ///
    /// * `repository` - Refresh token repository
    /// * `config` - Signing configuration; supplies the token lifetime
    pub fn new(repository: Arc<R>, config: &SigningConfiguration) -> Self {
        Self {
            repository,
            lifetime: config.refresh_token_lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Create and persist a new token for `user_id`
    ///
    /// # Returns
    ///
    /// * `Ok(RefreshToken)` - The committed token
    /// * `Err(DomainError)` - Persistence failed or was cancelled
    pub async fn generate_token(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<RefreshToken, DomainError> {
        let token = RefreshToken::new(user_id, new_payload(), self.lifetime);

        self.repository.add(token.clone(), cancel).await?;
        self.repository.save_changes(cancel).await?;

        tracing::info!(user_id = %user_id, token_id = %token.id, "Issued refresh token");
        Ok(token)
    }

    /// Rotate a token in place: new payload and new expiry, same id
    pub async fn update_token_payload(
        &self,
        token: &RefreshToken,
        cancel: &CancellationToken,
    ) -> Result<RefreshToken, DomainError> {
        let rotated = token.rotated(new_payload(), self.lifetime);

        self.repository.update(rotated.clone(), cancel).await?;
        self.repository.save_changes(cancel).await?;

        tracing::info!(user_id = %token.user_id, token_id = %token.id, "Rotated refresh token");
        Ok(rotated)
    }

    /// Delete every token of a user
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of tokens revoked
    pub async fn revoke_all(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<usize, DomainError> {
        let tokens = self
            .repository
            .find_all(&RefreshTokenSpec::ByUser(user_id), cancel)
            .await?;
        self.remove_all(&tokens, cancel).await?;

        tracing::info!(user_id = %user_id, revoked = tokens.len(), "Revoked all refresh tokens");
        Ok(tokens.len())
    }

    /// Delete the token carrying `payload`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token revoked
    /// * `Ok(false)` - No such token
    pub async fn revoke(&self, payload: &str, cancel: &CancellationToken) -> Result<bool, DomainError> {
        let token = self
            .repository
            .find_one(&RefreshTokenSpec::ByPayload(payload.to_string()), cancel)
            .await?;

        match token {
            Some(token) => {
                self.remove_all(std::slice::from_ref(&token), cancel).await?;
                tracing::info!(user_id = %token.user_id, token_id = %token.id, "Revoked refresh token");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Look up a live token by payload
    ///
    /// Unknown and expired tokens both yield `Ok(None)`.
    pub async fn find_by_payload(
        &self,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let token = self
            .repository
            .find_one(&RefreshTokenSpec::ByPayload(payload.to_string()), cancel)
            .await?;

        Ok(token.filter(|token| {
            let expired = token.is_expired();
            if expired {
                tracing::debug!(token_id = %token.id, "Refresh token expired");
            }
            !expired
        }))
    }

    /// Delete the expired tokens of a user
    pub async fn purge_expired(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<usize, DomainError> {
        let spec = RefreshTokenSpec::ExpiredForUser {
            user_id,
            now: Utc::now(),
        };
        let tokens = self.repository.find_all(&spec, cancel).await?;
        if tokens.is_empty() {
            return Ok(0);
        }
        self.remove_all(&tokens, cancel).await?;

        tracing::debug!(user_id = %user_id, purged = tokens.len(), "Purged expired refresh tokens");
        Ok(tokens.len())
    }

    async fn remove_all(&self, tokens: &[RefreshToken], cancel: &CancellationToken) -> Result<(), DomainError> {
        for token in tokens {
            self.repository.remove(token, cancel).await?;
        }
        self.repository.save_changes(cancel).await?;
        Ok(())
    }
}

/// Random payload of 100 to 120 bytes from the OS generator, standard base64
fn new_payload() -> String {
    let mut rng = OsRng;
    let len = rng.gen_range(MIN_PAYLOAD_BYTES..=MAX_PAYLOAD_BYTES);
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
pub(super) fn payload_for_tests() -> String {
    new_payload()
}
