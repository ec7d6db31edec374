//! Mock implementation of RefreshTokenRepository for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

use super::r#trait::{RefreshTokenRepository, UnitOfWork};
use super::spec::RefreshTokenSpec;

#[derive(Debug, Clone)]
enum StagedChange {
    Add(RefreshToken),
    Update(RefreshToken),
    Remove(Uuid),
}

/// Mock refresh token repository with unit-of-work staging
///
/// Counts staged writes and commits so tests can assert that a code path
/// performed no persistence.
pub struct MockRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, RefreshToken>>>,
    staged: Mutex<Vec<StagedChange>>,
    writes: AtomicUsize,
    commits: AtomicUsize,
    fail_next_commit: AtomicBool,
}

impl MockRefreshTokenRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            staged: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Insert a committed token directly
    pub async fn seed(&self, token: RefreshToken) {
        self.tokens.write().await.insert(token.id, token);
    }

    /// Snapshot of every committed token
    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<RefreshToken> {
        self.tokens.read().await.get(&id).cloned()
    }

    /// Number of add/update/remove calls staged so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make the next `save_changes` fail and discard its staged changes
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    async fn stage(&self, change: StagedChange, cancel: &CancellationToken) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.staged.lock().await.push(change);
        Ok(())
    }
}

impl Default for MockRefreshTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitOfWork for MockRefreshTokenRepository {
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, DomainError> {
        let changes: Vec<StagedChange> = std::mem::take(&mut *self.staged.lock().await);
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Internal {
                message: "Simulated commit failure".to_string(),
            });
        }

        let mut tokens = self.tokens.write().await;
        let mut next = tokens.clone();
        for change in &changes {
            match change {
                StagedChange::Add(token) => {
                    if next.contains_key(&token.id) {
                        return Err(DomainError::Validation {
                            message: "Token already exists".to_string(),
                        });
                    }
                    next.insert(token.id, token.clone());
                }
                StagedChange::Update(token) => {
                    if !next.contains_key(&token.id) {
                        return Err(DomainError::NotFound {
                            resource: format!("refresh token {}", token.id),
                        });
                    }
                    next.insert(token.id, token.clone());
                }
                StagedChange::Remove(id) => {
                    next.remove(id);
                }
            }
        }
        *tokens = next;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(changes.len())
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn add(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(StagedChange::Add(token), cancel).await
    }

    async fn update(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(StagedChange::Update(token), cancel).await
    }

    async fn remove(&self, token: &RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(StagedChange::Remove(token.id), cancel).await
    }

    async fn find_one(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Option<RefreshToken>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| spec.is_satisfied_by(t)).cloned())
    }

    async fn find_all(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<RefreshToken>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let tokens = self.tokens.read().await;
        Ok(tokens.values().filter(|t| spec.is_satisfied_by(t)).cloned().collect())
    }
}
