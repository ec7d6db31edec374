//! Tests for tri-state token validation

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::domain::entities::user::User;
use crate::domain::value_objects::claims::ClaimSet;
use crate::services::jwt::{InvalidTokenReason, JwtBuilder, JwtValidator, ValidationOutcome};
use crate::services::keys::KeyProvider;
use crate::testutil::{
    asymmetric_settings, primary_pem_pair, secondary_pem_pair, symmetric_settings,
    TEST_ISSUER, TEST_SYMMETRIC_KEY,
};

fn provider(settings: idp_shared::JwtSettings) -> Arc<KeyProvider> {
    Arc::new(KeyProvider::from_settings(&settings).unwrap())
}

fn token_from(settings: idp_shared::JwtSettings) -> String {
    JwtBuilder::new(provider(settings))
        .build_full(&User::new("alice"), ClaimSet::new())
        .unwrap()
        .token
}

fn secondary_settings() -> idp_shared::JwtSettings {
    idp_shared::JwtSettings::new(TEST_ISSUER).with_current_key_pair(secondary_pem_pair())
}

fn reason(outcome: ValidationOutcome) -> InvalidTokenReason {
    match outcome {
        ValidationOutcome::Invalid(reason) => reason,
        other => panic!("expected an invalid outcome, got {:?}", other),
    }
}

#[test]
fn test_unreadable_tokens() {
    let validator = JwtValidator::new(provider(symmetric_settings()));

    assert!(matches!(validator.validate(""), ValidationOutcome::Unreadable));
    assert!(matches!(validator.validate("not-a-token"), ValidationOutcome::Unreadable));
    assert!(matches!(validator.validate("a.b"), ValidationOutcome::Unreadable));
    assert!(matches!(validator.validate("###.###.###"), ValidationOutcome::Unreadable));
}

#[test]
fn test_unparseable_payload_is_unreadable() {
    let token = token_from(symmetric_settings());
    let parts: Vec<&str> = token.split('.').collect();
    let validator = JwtValidator::new(provider(symmetric_settings()));

    let not_base64 = format!("{}.%%%.{}", parts[0], parts[2]);
    assert!(matches!(validator.validate(&not_base64), ValidationOutcome::Unreadable));

    let not_json = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode("not json"), parts[2]);
    assert!(matches!(validator.validate(&not_json), ValidationOutcome::Unreadable));

    // Readable claims with a stale signature are still a signature failure
    let other_claims = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(r#"{"sub":"mallory"}"#), parts[2]);
    assert_eq!(reason(validator.validate(&other_claims)), InvalidTokenReason::InvalidSignature);
}

#[test]
fn test_wrong_key_is_invalid_signature() {
    let token = token_from(secondary_settings());
    let validator = JwtValidator::new(provider(asymmetric_settings()));

    assert_eq!(reason(validator.validate(&token)), InvalidTokenReason::InvalidSignature);
}

#[test]
fn test_tampered_token_is_invalid() {
    let token = token_from(symmetric_settings());
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_signature = "A".repeat(parts[2].len());
    parts[2] = &forged_signature;
    let forged = parts.join(".");

    let validator = JwtValidator::new(provider(symmetric_settings()));
    assert_eq!(reason(validator.validate(&forged)), InvalidTokenReason::InvalidSignature);
}

#[test]
fn test_wrong_issuer_is_invalid() {
    let mut other_issuer = symmetric_settings();
    other_issuer.token_issuer = "https://elsewhere.example".to_string();
    let token = token_from(other_issuer);

    let validator = JwtValidator::new(provider(symmetric_settings()));
    assert_eq!(reason(validator.validate(&token)), InvalidTokenReason::InvalidIssuer);
}

#[test]
fn test_expired_token_is_invalid() {
    let now = Utc::now().timestamp();
    let mut claims = ClaimSet::new();
    claims.insert("sub", "someone");
    claims.insert("iss", TEST_ISSUER);
    claims.insert("nbf", now - 7200);
    claims.insert("exp", now - 3600);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SYMMETRIC_KEY.as_bytes()),
    )
    .unwrap();

    let validator = JwtValidator::new(provider(symmetric_settings()));
    assert_eq!(reason(validator.validate(&token)), InvalidTokenReason::Expired);
}

#[test]
fn test_audience_is_not_checked() {
    let mut billing = symmetric_settings();
    billing.application_name = Some("billing".to_string());
    let token = token_from(billing);

    let validator = JwtValidator::new(provider(symmetric_settings()));
    assert!(validator.validate(&token).is_valid());
}

#[test]
fn test_symmetric_token_rejected_by_asymmetric_validator() {
    let token = token_from(symmetric_settings());
    let validator = JwtValidator::new(provider(asymmetric_settings()));

    assert_eq!(reason(validator.validate(&token)), InvalidTokenReason::AlgorithmNotAccepted);
}

#[test]
fn test_token_from_rotated_key_still_validates() {
    let old_token = token_from(asymmetric_settings());

    let rotated = asymmetric_settings().rotate_key_pair(secondary_pem_pair());
    let keys = provider(rotated);
    let validator = JwtValidator::new(Arc::clone(&keys));

    let decoded = validator.validate(&old_token).into_decoded().unwrap();
    assert_eq!(decoded.header.kid.as_deref(), Some(crate::testutil::fixtures::PRIMARY_KEY_ID));

    let new_token = JwtBuilder::new(keys)
        .build_full(&User::new("bob"), ClaimSet::new())
        .unwrap()
        .token;
    assert!(validator.validate(&new_token).is_valid());
}

#[test]
fn test_unknown_kid_falls_back_to_every_key() {
    let keys = provider(asymmetric_settings());
    let mut claims = ClaimSet::new();
    claims.insert("iss", TEST_ISSUER);
    claims.insert("exp", Utc::now().timestamp() + 600);

    let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some("stale-kid".to_string());
    let token = encode(&header, &claims, &keys.signing_key().encoding_key).unwrap();

    let validator = JwtValidator::new(provider(
        idp_shared::JwtSettings::new(TEST_ISSUER)
            .with_current_key_pair(secondary_pem_pair())
            .with_legacy_key_pair(primary_pem_pair()),
    ));
    assert!(validator.validate(&token).is_valid());
}
