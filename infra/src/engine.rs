//! Composition root wiring the core services to in-process backends

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use idp_core::errors::DomainError;
use idp_core::services::jwt::JwtValidator;
use idp_core::services::keys::{JwksExporter, KeyProvider};
use idp_core::services::package::{JwtPackageProvider, TwoFactorPlaceholderCache};
use idp_shared::JwtSettings;

use crate::cache::MemoryPlaceholderCache;
use crate::repository::{MemoryRefreshTokenRepository, MemoryTokenStore};

/// Every token engine service, sharing one key provider
pub struct TokenEngine<C: TwoFactorPlaceholderCache = MemoryPlaceholderCache> {
    pub keys: Arc<KeyProvider>,
    pub validator: JwtValidator,
    pub jwks: JwksExporter,
    pub store: MemoryTokenStore,
    cache: Arc<C>,
}

impl TokenEngine<MemoryPlaceholderCache> {
    /// Build an engine with in-process token store and placeholder cache
    pub fn in_memory(settings: &JwtSettings) -> Result<Self, DomainError> {
        Self::with_cache(settings, MemoryTokenStore::new(), Arc::new(MemoryPlaceholderCache::new()))
    }
}

impl<C: TwoFactorPlaceholderCache> TokenEngine<C> {
    /// Build an engine over an existing store and a chosen placeholder cache
    ///
    /// # Errors
    ///
    /// Returns the setup error when the settings are not usable
    pub fn with_cache(settings: &JwtSettings, store: MemoryTokenStore, cache: Arc<C>) -> Result<Self, DomainError> {
        let keys = Arc::new(KeyProvider::from_settings(settings)?);

        info!(
            issuer = %keys.configuration().issuer,
            validation_keys = keys.validation_keys().len(),
            "Token engine ready"
        );

        Ok(Self {
            validator: JwtValidator::new(Arc::clone(&keys)),
            jwks: JwksExporter::new(Arc::clone(&keys)),
            keys,
            store,
            cache,
        })
    }

    /// Package provider over a fresh unit-of-work scope
    ///
    /// Take one per request. Staged refresh token writes belong to the
    /// returned provider only, so a failed commit elsewhere cannot discard
    /// them.
    pub fn packages(&self) -> JwtPackageProvider<MemoryRefreshTokenRepository, C> {
        JwtPackageProvider::with_default_claims(
            Arc::clone(&self.keys),
            Arc::new(self.store.scope()),
            Arc::clone(&self.cache),
        )
    }

    /// Sweep expired refresh tokens from the store every `every`
    ///
    /// Runs until `cancel` fires. The first sweep happens immediately.
    pub fn start_sweeper(&self, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            info!(interval_secs = every.as_secs(), "Refresh token sweeper started");
            let mut timer = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {
                        let removed = store.sweep_expired(Utc::now()).await;
                        debug!(removed, "Refresh token sweep finished");
                    }
                }
            }
            info!("Refresh token sweeper stopped");
        })
    }
}
