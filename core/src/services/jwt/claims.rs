//! Claim assembly

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entities::user::{Team, TokenSubject};
use crate::domain::value_objects::claims::{names, ClaimSet};
use crate::errors::DomainError;

/// Supplies the domain claims of a full access token
///
/// Implementations may pre-populate registered claims such as `sub`; the
/// builder only fills in what is missing.
#[async_trait]
pub trait ClaimsAssembler<U: TokenSubject>: Send + Sync {
    /// Build the claims for `user` acting in `team`
    ///
    /// # Arguments
    /// * `user` - The token subject
    /// * `team` - Tenant the token is issued for
    /// * `device_id` - Client device, when known
    /// * `cancel` - Cancellation for lookups the assembler performs
    async fn assemble(
        &self,
        user: &U,
        team: &Team,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ClaimSet, DomainError>;
}

/// Minimal assembler emitting tenant and device claims
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectClaimsAssembler;

#[async_trait]
impl<U: TokenSubject> ClaimsAssembler<U> for SubjectClaimsAssembler {
    async fn assemble(
        &self,
        user: &U,
        team: &Team,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ClaimSet, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        let mut claims = ClaimSet::new();
        claims.insert(names::SUBJECT, user.id().to_string());
        claims.insert("team_id", team.id.to_string());
        claims.insert("team_name", team.name.clone());
        if let Some(device_id) = device_id {
            claims.insert("device_id", device_id);
        }
        Ok(claims)
    }
}

/// Adds the registered claims every token carries
pub struct RegisteredClaimsAdder;

impl RegisteredClaimsAdder {
    /// Insert `sub`, `iss`, `jti` and `iat` unless already present
    ///
    /// `jti` is a fresh random UUID.
    pub fn add(claims: &mut ClaimSet, subject: Uuid, issuer: &str, now: DateTime<Utc>) {
        claims.insert_if_absent(names::SUBJECT, subject.to_string());
        claims.insert_if_absent(names::ISSUER, issuer);
        claims.insert_if_absent(names::JWT_ID, Uuid::new_v4().to_string());
        claims.insert_if_absent(names::ISSUED_AT, now.timestamp());
    }
}
