//! In-memory refresh token persistence
//!
//! [`MemoryTokenStore`] holds the committed rows and is shared by the whole
//! process. Each [`MemoryRefreshTokenRepository`] is a unit-of-work scope over
//! the store: writes are staged per scope and land together on
//! `save_changes`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use idp_core::domain::entities::token::RefreshToken;
use idp_core::errors::DomainError;
use idp_core::repositories::{RefreshTokenRepository, RefreshTokenSpec, UnitOfWork};

#[derive(Default)]
struct TokenTable {
    rows: HashMap<Uuid, RefreshToken>,
    by_payload: HashMap<String, Uuid>,
}

impl TokenTable {
    fn insert(&mut self, token: RefreshToken) {
        if let Some(previous) = self.rows.get(&token.id) {
            self.by_payload.remove(&previous.payload);
        }
        self.by_payload.insert(token.payload.clone(), token.id);
        self.rows.insert(token.id, token);
    }

    fn remove(&mut self, id: &Uuid) -> Option<RefreshToken> {
        let removed = self.rows.remove(id)?;
        self.by_payload.remove(&removed.payload);
        Some(removed)
    }

    fn find(&self, spec: &RefreshTokenSpec) -> Option<&RefreshToken> {
        match spec {
            RefreshTokenSpec::ById(id) => self.rows.get(id),
            RefreshTokenSpec::ByPayload(payload) => {
                self.by_payload.get(payload).and_then(|id| self.rows.get(id))
            }
            _ => self.rows.values().find(|token| spec.is_satisfied_by(token)),
        }
    }

    /// Reject a batch that would not apply cleanly, before touching any row
    ///
    /// Ids and payloads are checked against the committed rows as amended by
    /// the earlier changes of the same batch.
    fn check<'a>(&'a self, changes: &'a [PendingChange]) -> Result<(), DomainError> {
        let mut view = BatchView {
            table: self,
            rows: HashMap::new(),
            payloads: HashMap::new(),
        };

        for change in changes {
            match change {
                PendingChange::Add(token) => {
                    if view.payload_of(&token.id).is_some() {
                        return Err(DomainError::Validation {
                            message: format!("Refresh token {} already exists", token.id),
                        });
                    }
                    if view.owner_of(&token.payload).is_some() {
                        return Err(payload_in_use());
                    }
                    view.put(token);
                }
                PendingChange::Update(token) => {
                    if view.payload_of(&token.id).is_none() {
                        return Err(DomainError::NotFound {
                            resource: format!("refresh token {}", token.id),
                        });
                    }
                    if matches!(view.owner_of(&token.payload), Some(owner) if owner != token.id) {
                        return Err(payload_in_use());
                    }
                    view.put(token);
                }
                PendingChange::Remove(id) => view.drop_row(*id),
            }
        }
        Ok(())
    }
}

/// Committed rows overlaid with the changes checked so far
struct BatchView<'a> {
    table: &'a TokenTable,
    /// Staged payload per id; `None` once removed
    rows: HashMap<Uuid, Option<&'a str>>,
    /// Staged owner per payload; `None` once released
    payloads: HashMap<&'a str, Option<Uuid>>,
}

impl<'a> BatchView<'a> {
    fn payload_of(&self, id: &Uuid) -> Option<&'a str> {
        match self.rows.get(id) {
            Some(payload) => *payload,
            None => self.table.rows.get(id).map(|token| token.payload.as_str()),
        }
    }

    fn owner_of(&self, payload: &str) -> Option<Uuid> {
        match self.payloads.get(payload) {
            Some(owner) => *owner,
            None => self.table.by_payload.get(payload).copied(),
        }
    }

    fn put(&mut self, token: &'a RefreshToken) {
        self.release(&token.id);
        self.payloads.insert(token.payload.as_str(), Some(token.id));
        self.rows.insert(token.id, Some(token.payload.as_str()));
    }

    fn drop_row(&mut self, id: Uuid) {
        self.release(&id);
        self.rows.insert(id, None);
    }

    fn release(&mut self, id: &Uuid) {
        if let Some(previous) = self.payload_of(id) {
            self.payloads.insert(previous, None);
        }
    }
}

fn payload_in_use() -> DomainError {
    DomainError::Validation {
        message: "Refresh token payload already in use".to_string(),
    }
}

#[derive(Debug, Clone)]
enum PendingChange {
    Add(RefreshToken),
    Update(RefreshToken),
    Remove(Uuid),
}

/// Process-wide committed refresh tokens
///
/// Cheap to clone; clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    table: Arc<RwLock<TokenTable>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit-of-work scope, typically one per request
    pub fn scope(&self) -> MemoryRefreshTokenRepository {
        MemoryRefreshTokenRepository {
            store: self.clone(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of committed tokens
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every token that expired at or before `now`
    ///
    /// # Returns
    /// Number of tokens removed
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut table = self.table.write().await;
        let expired: Vec<Uuid> = table
            .rows
            .values()
            .filter(|token| token.is_expired_at(now))
            .map(|token| token.id)
            .collect();
        for id in &expired {
            table.remove(id);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "Swept expired refresh tokens");
        }
        expired.len()
    }
}

/// Unit-of-work scope over a [`MemoryTokenStore`]
///
/// Staged writes are private to this scope until committed; reads always see
/// committed rows only.
pub struct MemoryRefreshTokenRepository {
    store: MemoryTokenStore,
    pending: Mutex<Vec<PendingChange>>,
}

impl MemoryRefreshTokenRepository {
    /// Number of staged, uncommitted changes
    pub async fn pending_changes(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn stage(&self, change: PendingChange, cancel: &CancellationToken) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        self.pending.lock().await.push(change);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryRefreshTokenRepository {
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<usize, DomainError> {
        let changes = std::mem::take(&mut *self.pending.lock().await);
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if changes.is_empty() {
            return Ok(0);
        }

        let mut table = self.store.table.write().await;
        table.check(&changes)?;
        for change in &changes {
            match change {
                PendingChange::Add(token) | PendingChange::Update(token) => table.insert(token.clone()),
                PendingChange::Remove(id) => {
                    table.remove(id);
                }
            }
        }

        debug!(changes = changes.len(), "Committed refresh token changes");
        Ok(changes.len())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn add(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(PendingChange::Add(token), cancel).await
    }

    async fn update(&self, token: RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(PendingChange::Update(token), cancel).await
    }

    async fn remove(&self, token: &RefreshToken, cancel: &CancellationToken) -> Result<(), DomainError> {
        self.stage(PendingChange::Remove(token.id), cancel).await
    }

    async fn find_one(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Option<RefreshToken>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let table = self.store.table.read().await;
        Ok(table.find(spec).cloned())
    }

    async fn find_all(
        &self,
        spec: &RefreshTokenSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<RefreshToken>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let table = self.store.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|token| spec.is_satisfied_by(token))
            .cloned()
            .collect())
    }
}
