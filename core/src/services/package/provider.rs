//! Token package orchestration

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::traits::TwoFactorPlaceholderCache;
use crate::domain::entities::token::RefreshToken;
use crate::domain::entities::user::{Team, TokenSubject};
use crate::domain::value_objects::{
    IssueResult, PendingTwoFactorPackage, TokenPackage, TwoFactorState,
};
use crate::errors::{DomainError, TokenError};
use crate::repositories::{RefreshTokenRepository, SubjectLookup};
use crate::services::jwt::{BuiltToken, ClaimsAssembler, JwtBuilder, SubjectClaimsAssembler};
use crate::services::keys::{KeyProvider, SigningConfiguration};
use crate::services::refresh_token::RefreshTokenService;

/// Random bytes in a two-factor placeholder token
const PLACEHOLDER_TOKEN_BYTES: usize = 32;

/// Issues token packages and drives the login state machine
///
/// ```text
/// Unauthenticated --login, no 2FA------> Issued(access[, refresh])
/// Unauthenticated --login, 2FA---------> PendingTwoFactor(placeholder)
/// PendingTwoFactor --2FA verified------> Issued(access[, refresh])
/// Issued --refresh with live token-----> Issued(access[, refresh rotated or reused])
/// Issued --expiry or revocation--------> Unauthenticated
/// ```
pub struct JwtPackageProvider<R, C, A = SubjectClaimsAssembler>
where
    R: RefreshTokenRepository,
    C: TwoFactorPlaceholderCache,
{
    config: Arc<SigningConfiguration>,
    builder: JwtBuilder,
    refresh_tokens: RefreshTokenService<R>,
    placeholders: Arc<C>,
    claims: Arc<A>,
}

impl<R, C> JwtPackageProvider<R, C, SubjectClaimsAssembler>
where
    R: RefreshTokenRepository,
    C: TwoFactorPlaceholderCache,
{
    /// Creates a provider using [`SubjectClaimsAssembler`] for full-token claims
    pub fn with_default_claims(keys: Arc<KeyProvider>, repository: Arc<R>, placeholders: Arc<C>) -> Self {
        Self::new(keys, repository, placeholders, Arc::new(SubjectClaimsAssembler))
    }
}

impl<R, C, A> JwtPackageProvider<R, C, A>
where
    R: RefreshTokenRepository,
    C: TwoFactorPlaceholderCache,
{
    /// Creates a new package provider
    ///
    /// # Arguments
    ///
    /// * `keys` - Key provider; its configuration drives lifetimes and policy
    /// * `repository` - Refresh token repository
    /// * `placeholders` - Two-factor placeholder cache
    /// * `claims` - Assembler for full-token claims
    pub fn new(keys: Arc<KeyProvider>, repository: Arc<R>, placeholders: Arc<C>, claims: Arc<A>) -> Self {
        let config = keys.shared_configuration();
        Self {
            refresh_tokens: RefreshTokenService::new(repository, &config),
            builder: JwtBuilder::new(keys),
            config,
            placeholders,
            claims,
        }
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenService<R> {
        &self.refresh_tokens
    }

    /// Park a user between first and second factor
    ///
    /// Stores the user id under a fresh placeholder token for the configured
    /// TTL. No access or refresh token is issued.
    pub async fn issue_two_factor_required<U: TokenSubject>(
        &self,
        user: &U,
        provider: &str,
        extra_info: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<PendingTwoFactorPackage, DomainError> {
        let placeholder = new_placeholder_token();
        self.placeholders
            .store(&placeholder, user.id(), self.config.two_factor_token_ttl, cancel)
            .await?;

        tracing::info!(user_id = %user.id(), provider, "Two-factor verification pending");
        Ok(PendingTwoFactorPackage {
            two_factor_token: placeholder,
            two_factor_provider: provider.to_string(),
            extra_info,
        })
    }

    /// Exchange a placeholder for the user id it stands for
    ///
    /// Single use: a second call with the same placeholder returns `Ok(None)`.
    pub async fn resolve_two_factor(
        &self,
        placeholder: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Uuid>, DomainError> {
        let user_id = self.placeholders.take(placeholder, cancel).await?;
        if user_id.is_none() {
            tracing::warn!("Unknown or expired two-factor placeholder");
        }
        Ok(user_id)
    }

    /// Finish a login once the second factor has been checked
    ///
    /// Consumes the placeholder and issues a verified package for its user.
    ///
    /// # Errors
    ///
    /// * `TokenError::InvalidTwoFactorToken` - Unknown, expired or already used placeholder
    /// * `DomainError::NotFound` - The parked user no longer exists
    pub async fn complete_two_factor<U, L>(
        &self,
        placeholder: &str,
        team: &Team,
        device_id: Option<&str>,
        lookup: &L,
        cancel: &CancellationToken,
    ) -> Result<TokenPackage, DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
        L: SubjectLookup<U>,
    {
        let user_id = self
            .resolve_two_factor(placeholder, cancel)
            .await?
            .ok_or(TokenError::InvalidTwoFactorToken)?;
        let user = lookup
            .find_subject(user_id, cancel)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: format!("user {}", user_id),
            })?;

        self.issue_package(&user, team, true, device_id, cancel).await
    }

    /// Log out one device
    pub async fn logout(&self, payload: &str, cancel: &CancellationToken) -> Result<bool, DomainError> {
        self.refresh_tokens.revoke(payload, cancel).await
    }

    /// Log out every device of a user
    pub async fn logout_everywhere(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<usize, DomainError> {
        self.refresh_tokens.revoke_all(user_id, cancel).await
    }

    /// Whether a refresh token may be issued alongside the access token
    fn refresh_eligible<U: TokenSubject>(&self, user: &U, two_factor_verified: bool) -> bool {
        self.config.refresh_tokens_enabled && (!user.two_factor_enabled() || two_factor_verified)
    }

    /// Issue an access token and, when eligible, a refresh token
    ///
    /// A user with two-factor enabled who has not verified it gets the
    /// restricted token shape and no refresh token.
    pub async fn issue_package<U>(
        &self,
        user: &U,
        team: &Team,
        two_factor_verified: bool,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TokenPackage, DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
    {
        let (access, state) = self
            .build_access_token(user, team, two_factor_verified, device_id, cancel)
            .await?;

        let refresh_token = if self.refresh_eligible(user, two_factor_verified) {
            Some(self.refresh_tokens.generate_token(user.id(), cancel).await?.payload)
        } else {
            tracing::debug!(user_id = %user.id(), ?state, "Refresh token not issued");
            None
        };

        tracing::info!(user_id = %user.id(), jti = %access.jti, ?state, "Issued token package");
        Ok(self.package(user, access, state, refresh_token))
    }

    /// Re-issue an access token for the owner of `existing`
    ///
    /// A live refresh token proves an earlier fully verified login, so the
    /// access token is always built as two-factor verified. The rotation
    /// policy decides whether `existing` gets a new payload.
    pub async fn refresh_package<U>(
        &self,
        existing: &RefreshToken,
        user: &U,
        team: &Team,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TokenPackage, DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
    {
        let (access, state) = self.build_access_token(user, team, true, device_id, cancel).await?;

        let refresh_token = if !self.config.refresh_tokens_enabled {
            None
        } else if self.config.refresh_token_update_policy.should_rotate(
            existing.created_at,
            existing.expires_at,
            Utc::now(),
        ) {
            let rotated = self.refresh_tokens.update_token_payload(existing, cancel).await?;
            Some(rotated.payload)
        } else {
            tracing::debug!(
                token_id = %existing.id,
                policy = %self.config.refresh_token_update_policy,
                "Reusing refresh token"
            );
            Some(existing.payload.clone())
        };

        tracing::info!(user_id = %user.id(), jti = %access.jti, "Refreshed token package");
        Ok(self.package(user, access, state, refresh_token))
    }

    /// First step of a login
    ///
    /// Users with two-factor enabled get a placeholder; everyone else gets a
    /// token package.
    pub async fn issue_for_login<U>(
        &self,
        user: &U,
        team: &Team,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<IssueResult, DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
    {
        if user.two_factor_enabled() {
            let provider = user.two_factor_provider().ok_or_else(|| DomainError::Validation {
                message: format!("User {} has two-factor enabled without a provider", user.id()),
            })?;
            let pending = self.issue_two_factor_required(user, provider, None, cancel).await?;
            return Ok(IssueResult::PendingTwoFactor(pending));
        }

        let package = self.issue_package(user, team, false, device_id, cancel).await?;
        Ok(IssueResult::Issued(package))
    }

    /// Exchange a refresh payload for a new package
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TokenPackage))` - Refreshed
    /// * `Ok(None)` - Unknown or expired payload, or the user no longer exists
    pub async fn refresh<U, L>(
        &self,
        payload: &str,
        team: &Team,
        device_id: Option<&str>,
        lookup: &L,
        cancel: &CancellationToken,
    ) -> Result<Option<TokenPackage>, DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
        L: SubjectLookup<U>,
    {
        let Some(existing) = self.refresh_tokens.find_by_payload(payload, cancel).await? else {
            tracing::warn!("Refresh attempted with unknown or expired token");
            return Ok(None);
        };
        let Some(user) = lookup.find_subject(existing.user_id, cancel).await? else {
            tracing::warn!(user_id = %existing.user_id, "Refresh token owner no longer exists");
            return Ok(None);
        };

        let package = self
            .refresh_package(&existing, &user, team, device_id, cancel)
            .await?;
        Ok(Some(package))
    }

    async fn build_access_token<U>(
        &self,
        user: &U,
        team: &Team,
        two_factor_verified: bool,
        device_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(BuiltToken, TwoFactorState), DomainError>
    where
        U: TokenSubject,
        A: ClaimsAssembler<U>,
    {
        let state = TwoFactorState::resolve(user.two_factor_enabled(), two_factor_verified);
        let access = if state.grants_full_access() {
            let claims = self.claims.assemble(user, team, device_id, cancel).await?;
            self.builder.build_full(user, claims)?
        } else {
            self.builder.build_two_factor_required(user)?
        };
        Ok((access, state))
    }

    fn package<U: TokenSubject>(
        &self,
        user: &U,
        access: BuiltToken,
        state: TwoFactorState,
        refresh_token: Option<String>,
    ) -> TokenPackage {
        TokenPackage {
            access_token: access.token,
            expires_at: access.expires_at,
            two_factor_provider: user.two_factor_provider().map(str::to_string),
            two_factor_state: state,
            refresh_token,
        }
    }
}

fn new_placeholder_token() -> String {
    let mut bytes = [0u8; PLACEHOLDER_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
