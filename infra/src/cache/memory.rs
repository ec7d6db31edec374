//! In-process two-factor placeholder cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use idp_core::errors::DomainError;
use idp_core::services::package::TwoFactorPlaceholderCache;

#[derive(Debug, Clone, Copy)]
struct Entry {
    user_id: Uuid,
    expires_at: Instant,
}

/// Placeholder cache for single-instance deployments
///
/// Expired entries are never returned. Every `store` drops the entries that
/// have expired, so abandoned logins do not accumulate.
#[derive(Clone, Default)]
pub struct MemoryPlaceholderCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryPlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live placeholders
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove expired placeholders
    ///
    /// # Returns
    /// Number of entries removed
    pub async fn purge_expired(&self) -> usize {
        prune(&mut *self.entries.write().await, Instant::now())
    }
}

fn prune(entries: &mut HashMap<String, Entry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    let removed = before - entries.len();
    if removed > 0 {
        debug!(removed, "Dropped expired two-factor placeholders");
    }
    removed
}

#[async_trait]
impl TwoFactorPlaceholderCache for MemoryPlaceholderCache {
    async fn store(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| DomainError::Validation {
            message: format!("Two-factor placeholder TTL of {}s is out of range", ttl.as_secs()),
        })?;

        let mut entries = self.entries.write().await;
        prune(&mut entries, now);
        entries.insert(token.to_string(), Entry { user_id, expires_at });
        Ok(())
    }

    async fn take(&self, token: &str, cancel: &CancellationToken) -> Result<Option<Uuid>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let entry = self.entries.write().await.remove(token);
        Ok(entry
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.user_id))
    }
}
