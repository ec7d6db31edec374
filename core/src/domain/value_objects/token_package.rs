//! Issuance results returned to callers.

use serde::{Deserialize, Serialize};

/// Two-factor status of an issued access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TwoFactorState {
    /// The user has no second factor
    NotEnabled,
    /// A second factor exists but has not been presented; the token is restricted
    Required,
    /// The second factor was verified
    Verified,
}

impl TwoFactorState {
    pub fn resolve(two_factor_enabled: bool, two_factor_verified: bool) -> Self {
        match (two_factor_enabled, two_factor_verified) {
            (false, _) => TwoFactorState::NotEnabled,
            (true, false) => TwoFactorState::Required,
            (true, true) => TwoFactorState::Verified,
        }
    }

    /// Whether the token carries the full claim set
    pub fn grants_full_access(&self) -> bool {
        !matches!(self, TwoFactorState::Required)
    }
}

/// Access token with an optional refresh token
///
/// # Fields
///
/// * `access_token` - Signed JWT
/// * `expires_at` - Access token expiry (unix seconds)
/// * `two_factor_provider` / `two_factor_state` - Second-factor status of the user
/// * `refresh_token` - Refresh payload, present only when the user is eligible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPackage {
    pub access_token: String,
    pub expires_at: i64,
    pub two_factor_provider: Option<String>,
    pub two_factor_state: TwoFactorState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub refresh_token: Option<String>,
}

/// Placeholder handed out between first and second factor
///
/// Carries no access or refresh token. The placeholder is exchanged for the
/// user id once the second factor has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTwoFactorPackage {
    pub two_factor_token: String,
    pub two_factor_provider: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extra_info: Option<String>,
}

/// Outcome of a login-driven issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IssueResult {
    Issued(TokenPackage),
    PendingTwoFactor(PendingTwoFactorPackage),
}

impl IssueResult {
    pub fn token_package(&self) -> Option<&TokenPackage> {
        match self {
            IssueResult::Issued(package) => Some(package),
            IssueResult::PendingTwoFactor(_) => None,
        }
    }

    pub fn pending_two_factor(&self) -> Option<&PendingTwoFactorPackage> {
        match self {
            IssueResult::Issued(_) => None,
            IssueResult::PendingTwoFactor(pending) => Some(pending),
        }
    }
}
