//! Refresh token repository and unit-of-work traits.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::spec::RefreshTokenSpec;
use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

/// Commits staged repository changes
///
/// Writes made through a repository are staged and become visible only when
/// [`UnitOfWork::save_changes`] succeeds. A commit applies every staged change
/// or none of them.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Apply all staged changes
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of changes applied
    /// * `Err(DomainError::Cancelled)` - `cancel` fired before the commit; nothing was applied
    /// * `Err(DomainError)` - Commit failed; nothing was applied
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, DomainError>;
}

/// Repository trait for [`RefreshToken`] persistence
///
/// Tokens are only ever added, replaced as a whole, or removed. Implementations
/// must never expose a row whose payload and expiry come from different writes.
/// Reads return committed state only.
///
/// Every call takes a cancellation token; a cancelled call returns
/// `DomainError::Cancelled` without staging or reading anything.
#[async_trait]
pub trait RefreshTokenRepository: UnitOfWork {
    /// Stage a new token
    ///
    /// # Arguments
    /// * `token` - The token to insert
    /// * `cancel` - Cancellation for this call
    async fn add(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError>;

    /// Stage a whole-entity replacement of the token with the same id
    async fn update(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError>;

    /// Stage the deletion of a token
    async fn remove(&self, token: &RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError>;

    /// Find the first committed token matching `spec`
    ///
    /// # Returns
    /// * `Ok(Some(RefreshToken))` - Token found
    /// * `Ok(None)` - No token matches
    /// * `Err(DomainError)` - Storage error
    async fn find_one(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Option<RefreshToken>, DomainError>;

    /// Find every committed token matching `spec`
    async fn find_all(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<RefreshToken>, DomainError>;
}
