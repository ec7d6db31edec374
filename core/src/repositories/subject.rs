//! User lookup used by the refresh flow.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::user::TokenSubject;
use crate::errors::DomainError;

/// Loads the subject a refresh token belongs to
#[async_trait]
pub trait SubjectLookup<U: TokenSubject>: Send + Sync {
    /// Find a user by id
    ///
    /// # Returns
    /// * `Ok(Some(U))` - User found
    /// * `Ok(None)` - The user no longer exists
    /// * `Err(DomainError)` - Storage error
    async fn find_subject(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Option<U>, DomainError>;
}
