//! Collaborator traits for package issuance

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::DomainError;

/// Short-lived store for two-factor placeholder tokens
///
/// Maps an opaque placeholder to the user who passed the first factor.
/// Entries disappear after their TTL and can be taken only once.
#[async_trait]
pub trait TwoFactorPlaceholderCache: Send + Sync {
    /// Store `user_id` under `token` for `ttl`
    ///
    /// # Returns
    /// * `Ok(())` - Stored
    /// * `Err(DomainError::Cancelled)` - `cancel` fired; nothing was stored
    /// * `Err(DomainError)` - Backend failure
    async fn store(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;

    /// Remove and return the user stored under `token`
    ///
    /// # Returns
    /// * `Ok(Some(Uuid))` - The placeholder was live; it is now gone
    /// * `Ok(None)` - Unknown, expired or already taken
    async fn take(&self, token: &str, cancel: &CancellationToken) -> Result<Option<Uuid>, DomainError>;
}
