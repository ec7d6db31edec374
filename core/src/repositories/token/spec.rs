//! Query specifications for refresh tokens.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;

/// Selects refresh tokens in repository queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTokenSpec {
    /// The token with this row id
    ById(Uuid),
    /// The token carrying this payload
    ByPayload(String),
    /// Every token owned by the user
    ByUser(Uuid),
    /// Tokens of the user that expired at or before `now`
    ExpiredForUser { user_id: Uuid, now: DateTime<Utc> },
}

impl RefreshTokenSpec {
    /// In-memory evaluation, for stores that filter in process
    pub fn is_satisfied_by(&self, token: &RefreshToken) -> bool {
        match self {
            RefreshTokenSpec::ById(id) => token.id == *id,
            RefreshTokenSpec::ByPayload(payload) => token.payload == *payload,
            RefreshTokenSpec::ByUser(user_id) => token.user_id == *user_id,
            RefreshTokenSpec::ExpiredForUser { user_id, now } => {
                token.user_id == *user_id && token.is_expired_at(*now)
            }
        }
    }
}
