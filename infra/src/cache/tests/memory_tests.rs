//! Unit tests for MemoryPlaceholderCache

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use idp_core::errors::DomainError;
use idp_core::services::package::TwoFactorPlaceholderCache;

use crate::cache::MemoryPlaceholderCache;

#[tokio::test]
async fn test_take_is_single_use() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    cache.store("placeholder", user_id, Duration::from_secs(300), &cancel).await.unwrap();
    assert_eq!(cache.len().await, 1);

    assert_eq!(cache.take("placeholder", &cancel).await.unwrap(), Some(user_id));
    assert_eq!(cache.take("placeholder", &cancel).await.unwrap(), None);
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire_after_ttl() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();

    cache.store("short", Uuid::new_v4(), Duration::from_secs(30), &cancel).await.unwrap();
    cache.store("long", Uuid::new_v4(), Duration::from_secs(300), &cancel).await.unwrap();

    tokio::time::advance(Duration::from_secs(31)).await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.take("short", &cancel).await.unwrap(), None);
    assert!(cache.take("long", &cancel).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_purge_expired() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();

    for i in 0..3 {
        cache
            .store(&format!("token-{}", i), Uuid::new_v4(), Duration::from_secs(10), &cancel)
            .await
            .unwrap();
    }
    cache.store("keeper", Uuid::new_v4(), Duration::from_secs(600), &cancel).await.unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(cache.purge_expired().await, 3);
    assert_eq!(cache.purge_expired().await, 0);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_cancelled_calls_touch_nothing() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();
    cache.store("placeholder", Uuid::new_v4(), Duration::from_secs(60), &cancel).await.unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    assert!(matches!(
        cache.store("other", Uuid::new_v4(), Duration::from_secs(60), &cancelled).await,
        Err(DomainError::Cancelled)
    ));
    assert!(matches!(cache.take("placeholder", &cancelled).await, Err(DomainError::Cancelled)));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_clones_share_entries() {
    let cache = MemoryPlaceholderCache::new();
    let other = cache.clone();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    cache.store("shared", user_id, Duration::from_secs(60), &cancel).await.unwrap();
    assert_eq!(other.take("shared", &cancel).await.unwrap(), Some(user_id));
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_store_drops_expired_entries() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();

    for i in 0..5 {
        cache
            .store(&format!("abandoned-{}", i), Uuid::new_v4(), Duration::from_secs(30), &cancel)
            .await
            .unwrap();
    }
    tokio::time::advance(Duration::from_secs(31)).await;

    cache.store("fresh", Uuid::new_v4(), Duration::from_secs(300), &cancel).await.unwrap();
    assert_eq!(cache.purge_expired().await, 0);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_out_of_range_ttl_is_rejected() {
    let cache = MemoryPlaceholderCache::new();
    let cancel = CancellationToken::new();

    let result = cache.store("forever", Uuid::new_v4(), Duration::MAX, &cancel).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(cache.is_empty().await);
}
