//! Token subjects and tenants.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the token engine needs to know about a user
///
/// Any account type can be issued tokens by implementing this trait; the
/// engine never inspects anything beyond these three facts.
pub trait TokenSubject: Send + Sync {
    /// Stable user id, used as `sub`
    fn id(&self) -> Uuid;

    /// Whether a second factor is required at login
    fn two_factor_enabled(&self) -> bool;

    /// Name of the second-factor provider (e.g. "Email", "Authenticator")
    fn two_factor_provider(&self) -> Option<&str>;
}

/// Plain user record implementing [`TokenSubject`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// Login name
    pub user_name: String,

    /// Whether two-factor authentication is enabled
    pub two_factor_enabled: bool,

    /// Configured second-factor provider
    pub two_factor_provider: Option<String>,
}

impl User {
    /// Creates a user without two-factor authentication
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            two_factor_enabled: false,
            two_factor_provider: None,
        }
    }

    /// Enables two-factor authentication with the given provider
    pub fn with_two_factor(mut self, provider: impl Into<String>) -> Self {
        self.two_factor_enabled = true;
        self.two_factor_provider = Some(provider.into());
        self
    }
}

impl TokenSubject for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn two_factor_enabled(&self) -> bool {
        self.two_factor_enabled
    }

    fn two_factor_provider(&self) -> Option<&str> {
        self.two_factor_provider.as_deref()
    }
}

/// Tenant the token is issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
