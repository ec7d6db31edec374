//! Unit tests for MemoryTokenStore and its unit-of-work scopes

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use idp_core::domain::entities::token::RefreshToken;
use idp_core::errors::DomainError;
use idp_core::repositories::{RefreshTokenRepository, RefreshTokenSpec, UnitOfWork};

use crate::repository::MemoryTokenStore;

fn token(user_id: Uuid, payload: &str) -> RefreshToken {
    RefreshToken::new(user_id, payload.to_string(), Duration::days(1))
}

#[tokio::test]
async fn test_staged_writes_are_private_to_scope() {
    let store = MemoryTokenStore::new();
    let writer = store.scope();
    let reader = store.scope();
    let cancel = CancellationToken::new();
    let token = token(Uuid::new_v4(), "payload-a");

    writer.add(token.clone(), &cancel).await.unwrap();
    assert_eq!(writer.pending_changes().await, 1);
    assert!(reader
        .find_one(&RefreshTokenSpec::ById(token.id), &cancel)
        .await
        .unwrap()
        .is_none());

    assert_eq!(writer.save_changes(&cancel).await.unwrap(), 1);
    assert_eq!(
        reader
            .find_one(&RefreshTokenSpec::ByPayload("payload-a".to_string()), &cancel)
            .await
            .unwrap(),
        Some(token)
    );
    assert_eq!(writer.pending_changes().await, 0);
}

#[tokio::test]
async fn test_update_replaces_whole_row_and_payload_index() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let original = token(Uuid::new_v4(), "old-payload");
    repo.add(original.clone(), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    let rotated = original.rotated("new-payload".to_string(), Duration::days(2));
    repo.update(rotated.clone(), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    let by_old = repo
        .find_one(&RefreshTokenSpec::ByPayload("old-payload".to_string()), &cancel)
        .await
        .unwrap();
    assert!(by_old.is_none());

    let by_new = repo
        .find_one(&RefreshTokenSpec::ByPayload("new-payload".to_string()), &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_new, rotated);
    assert_eq!(by_new.id, original.id);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_failed_batch_applies_nothing() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let fresh = token(user_id, "fresh");
    let missing = token(user_id, "missing");
    repo.add(fresh.clone(), &cancel).await.unwrap();
    repo.update(missing, &cancel).await.unwrap();

    let result = repo.save_changes(&cancel).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
    assert!(store.is_empty().await);
    assert_eq!(repo.pending_changes().await, 0);
}

#[tokio::test]
async fn test_duplicate_payload_is_rejected() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();

    repo.add(token(Uuid::new_v4(), "same"), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    repo.add(token(Uuid::new_v4(), "same"), &cancel).await.unwrap();
    let result = repo.save_changes(&cancel).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_cancelled_commit_discards_staged_changes() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();

    repo.add(token(Uuid::new_v4(), "payload"), &cancel).await.unwrap();
    cancel.cancel();

    assert!(matches!(repo.save_changes(&cancel).await, Err(DomainError::Cancelled)));
    assert!(matches!(
        repo.add(token(Uuid::new_v4(), "other"), &cancel).await,
        Err(DomainError::Cancelled)
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_remove_and_find_all_by_user() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let first = token(user_id, "one");
    repo.add(first.clone(), &cancel).await.unwrap();
    repo.add(token(user_id, "two"), &cancel).await.unwrap();
    repo.add(token(Uuid::new_v4(), "three"), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    let owned = repo.find_all(&RefreshTokenSpec::ByUser(user_id), &cancel).await.unwrap();
    assert_eq!(owned.len(), 2);

    repo.remove(&first, &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();
    let owned = repo.find_all(&RefreshTokenSpec::ByUser(user_id), &cancel).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].payload, "two");
}

#[tokio::test]
async fn test_sweep_expired() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    repo.add(RefreshToken::new(user_id, "short".to_string(), Duration::minutes(5)), &cancel)
        .await
        .unwrap();
    repo.add(token(user_id, "long"), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    assert_eq!(store.sweep_expired(Utc::now()).await, 0);
    assert_eq!(store.sweep_expired(Utc::now() + Duration::hours(1)).await, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_duplicate_payload_within_one_batch_is_rejected() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();

    repo.add(token(Uuid::new_v4(), "twin"), &cancel).await.unwrap();
    repo.add(token(Uuid::new_v4(), "twin"), &cancel).await.unwrap();

    let result = repo.save_changes(&cancel).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_update_onto_another_tokens_payload_is_rejected() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let first = token(user_id, "first");
    let second = token(user_id, "second");
    repo.add(first.clone(), &cancel).await.unwrap();
    repo.add(second.clone(), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    repo.update(first.rotated("second".to_string(), Duration::days(1)), &cancel)
        .await
        .unwrap();
    let result = repo.save_changes(&cancel).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));

    let owner = repo
        .find_one(&RefreshTokenSpec::ByPayload("second".to_string()), &cancel)
        .await
        .unwrap();
    assert_eq!(owner, Some(second));
}

#[tokio::test]
async fn test_payload_released_earlier_in_batch_can_be_reused() {
    let store = MemoryTokenStore::new();
    let repo = store.scope();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let original = token(user_id, "recycled");
    repo.add(original.clone(), &cancel).await.unwrap();
    repo.save_changes(&cancel).await.unwrap();

    let replacement = token(user_id, "recycled");
    repo.remove(&original, &cancel).await.unwrap();
    repo.add(replacement.clone(), &cancel).await.unwrap();
    assert_eq!(repo.save_changes(&cancel).await.unwrap(), 2);

    let found = repo
        .find_one(&RefreshTokenSpec::ByPayload("recycled".to_string()), &cancel)
        .await
        .unwrap();
    assert_eq!(found, Some(replacement));
}

#[tokio::test]
async fn test_failed_commit_in_one_scope_keeps_other_scopes_staging() {
    let store = MemoryTokenStore::new();
    let cancel = CancellationToken::new();
    let user_id = Uuid::new_v4();

    let first = store.scope();
    let second = store.scope();
    let staged = token(user_id, "staged");
    first.add(staged.clone(), &cancel).await.unwrap();

    second.update(token(user_id, "gone"), &cancel).await.unwrap();
    assert!(matches!(second.save_changes(&cancel).await, Err(DomainError::NotFound { .. })));

    assert_eq!(first.pending_changes().await, 1);
    assert_eq!(first.save_changes(&cancel).await.unwrap(), 1);
    assert_eq!(
        second.find_one(&RefreshTokenSpec::ById(staged.id), &cancel).await.unwrap(),
        Some(staged)
    );
}
