//! Integration tests for the in-memory token engine

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    use idp_core::domain::entities::token::RefreshToken;
    use idp_core::domain::entities::user::{Team, User};
    use idp_core::errors::DomainError;
    use idp_core::repositories::{RefreshTokenRepository, RefreshTokenSpec, UnitOfWork};
    use idp_core::domain::value_objects::IssueResult;
    use idp_core::services::package::TwoFactorPlaceholderCache;
    use idp_core::testutil::{asymmetric_settings, fixtures, secondary_pem_pair, symmetric_settings};
    use idp_infra::{MemoryPlaceholderCache, MemoryTokenStore, TokenEngine};

    #[tokio::test]
    async fn test_login_issues_tokens_that_validate() {
        let engine = TokenEngine::in_memory(&asymmetric_settings()).unwrap();
        let cancel = CancellationToken::new();
        let user = User::new("alice");

        let result = engine
            .packages()
            .issue_for_login(&user, &Team::new("acme"), None, &cancel)
            .await
            .unwrap();
        let package = result.token_package().unwrap();

        let decoded = engine.validator.validate(&package.access_token).into_decoded().unwrap();
        assert_eq!(decoded.header.kid.as_deref(), Some(fixtures::PRIMARY_KEY_ID));
        assert_eq!(engine.store.len().await, 1);

        let jwks = engine.jwks.jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].n, fixtures::PRIMARY_MODULUS_B64URL);
    }

    #[tokio::test]
    async fn test_engines_sharing_a_store_see_each_others_tokens() {
        let store = MemoryTokenStore::new();
        let settings = symmetric_settings();
        let first =
            TokenEngine::with_cache(&settings, store.clone(), Arc::new(MemoryPlaceholderCache::new())).unwrap();
        let second = TokenEngine::with_cache(&settings, store, Arc::new(MemoryPlaceholderCache::new())).unwrap();
        let cancel = CancellationToken::new();
        let user = User::new("alice");
        let team = Team::new("acme");

        let issued = first.packages().issue_package(&user, &team, false, None, &cancel).await.unwrap();
        let payload = issued.refresh_token.unwrap();

        assert!(second.packages().logout(&payload, &cancel).await.unwrap());
        assert!(first.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_two_factor_placeholder_round_trip() {
        let cache = Arc::new(MemoryPlaceholderCache::new());
        let engine = TokenEngine::with_cache(&symmetric_settings(), MemoryTokenStore::new(), Arc::clone(&cache)).unwrap();
        let cancel = CancellationToken::new();
        let user = User::new("bob").with_two_factor("Email");

        let pending = match engine
            .packages()
            .issue_for_login(&user, &Team::new("acme"), None, &cancel)
            .await
            .unwrap()
        {
            IssueResult::PendingTwoFactor(pending) => pending,
            IssueResult::Issued(_) => panic!("expected a pending two-factor result"),
        };
        assert_eq!(cache.len().await, 1);

        let user_id = engine.packages().resolve_two_factor(&pending.two_factor_token, &cancel).await.unwrap();
        assert_eq!(user_id, Some(user.id));
        assert!(cache.take(&pending.two_factor_token, &cancel).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotated_engine_accepts_tokens_from_previous_key() {
        let cancel = CancellationToken::new();
        let user = User::new("alice");
        let team = Team::new("acme");

        let before = TokenEngine::in_memory(&asymmetric_settings()).unwrap();
        let package = before.packages().issue_package(&user, &team, false, None, &cancel).await.unwrap();

        let after = TokenEngine::in_memory(&asymmetric_settings().rotate_key_pair(secondary_pem_pair())).unwrap();
        assert!(after.validator.validate(&package.access_token).is_valid());
        assert_eq!(after.jwks.jwks().keys.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_fast() {
        let mut settings = symmetric_settings();
        settings.symmetric_signing_key = Some("too-short".to_string());

        assert!(TokenEngine::in_memory(&settings).is_err());
    }

    #[tokio::test]
    async fn test_failed_rotation_does_not_discard_another_requests_write() {
        let engine = TokenEngine::in_memory(&symmetric_settings()).unwrap();
        let cancel = CancellationToken::new();
        let user = User::new("carol");
        let team = Team::new("acme");

        // A token that a concurrent logout has already removed
        let payload = engine
            .packages()
            .issue_package(&user, &team, false, None, &cancel)
            .await
            .unwrap()
            .refresh_token
            .unwrap();
        let stale = engine
            .store
            .scope()
            .find_one(&RefreshTokenSpec::ByPayload(payload), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(engine.packages().logout(&stale.payload, &cancel).await.unwrap());

        // Request A stages a new token but has not committed yet
        let request_a = engine.store.scope();
        let fresh = RefreshToken::new(user.id, "fresh-payload".to_string(), chrono::Duration::days(1));
        request_a.add(fresh.clone(), &cancel).await.unwrap();

        // Request B rotates the removed token and fails
        let rotation = engine
            .packages()
            .refresh_tokens()
            .update_token_payload(&stale, &cancel)
            .await;
        assert!(matches!(rotation, Err(DomainError::NotFound { .. })));

        assert_eq!(request_a.save_changes(&cancel).await.unwrap(), 1);
        let stored = engine
            .store
            .scope()
            .find_one(&RefreshTokenSpec::ById(fresh.id), &cancel)
            .await
            .unwrap();
        assert_eq!(stored, Some(fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_tokens_until_cancelled() {
        let engine = TokenEngine::in_memory(&symmetric_settings()).unwrap();
        let cancel = CancellationToken::new();
        let repo = engine.store.scope();
        let user_id = User::new("dave").id;

        let mut expired = RefreshToken::new(user_id, "expired".to_string(), chrono::Duration::minutes(5));
        expired.expires_at = Utc::now() - chrono::Duration::minutes(1);
        repo.add(expired, &cancel).await.unwrap();
        repo.add(RefreshToken::new(user_id, "live".to_string(), chrono::Duration::days(1)), &cancel)
            .await
            .unwrap();
        repo.save_changes(&cancel).await.unwrap();

        let sweeper = engine.start_sweeper(Duration::from_secs(60), cancel.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.store.len().await, 1);

        cancel.cancel();
        sweeper.await.unwrap();
    }
}
