//! Mock placeholder cache for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::traits::TwoFactorPlaceholderCache;
use crate::errors::DomainError;

/// In-process placeholder cache with wall-clock expiry
#[derive(Clone, Default)]
pub struct MockPlaceholderCache {
    entries: Arc<Mutex<HashMap<String, (Uuid, DateTime<Utc>)>>>,
}

impl MockPlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored placeholders, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TTL recorded for a placeholder, measured from now
    pub fn remaining_ttl(&self, token: &str) -> Option<chrono::Duration> {
        let entries = self.entries.lock().ok()?;
        entries.get(token).map(|(_, expires_at)| *expires_at - Utc::now())
    }

    /// Move every placeholder's expiry into the past
    pub fn expire_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            for (_, expires_at) in entries.values_mut() {
                *expires_at = Utc::now() - chrono::Duration::seconds(1);
            }
        }
    }
}

#[async_trait]
impl TwoFactorPlaceholderCache for MockPlaceholderCache {
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
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| DomainError::Validation {
            message: format!("Invalid placeholder TTL: {}", e),
        })?;
        let mut entries = self.entries.lock().map_err(|_| DomainError::Internal {
            message: "Placeholder cache lock poisoned".to_string(),
        })?;
        entries.insert(token.to_string(), (user_id, Utc::now() + ttl));
        Ok(())
    }

    async fn take(&self, token: &str, cancel: &CancellationToken) -> Result<Option<Uuid>, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let mut entries = self.entries.lock().map_err(|_| DomainError::Internal {
            message: "Placeholder cache lock poisoned".to_string(),
        })?;
        Ok(entries
            .remove(token)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| user_id))
    }
}
