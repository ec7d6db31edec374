//! Refresh token entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque refresh token stored by the refresh-token repository
///
/// A token only changes as a whole: [`RefreshToken::rotated`] produces the
/// replacement entity with a new payload and a new expiry under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Row identity; survives rotation
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Random payload presented by the client (standard base64)
    pub payload: String,

    /// Creation time of the current payload
    pub created_at: DateTime<Utc>,

    /// Expiry of the current payload
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Creates a new refresh token valid for `lifetime` from now
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owning user's id
    /// * `payload` - The encoded random payload
    /// * `lifetime` - Time until expiry
    pub fn new(user_id: Uuid, payload: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            payload,
            created_at: now,
            expires_at: expiry(now, lifetime),
        }
    }

    /// Replacement entity carrying a fresh payload and expiry
    ///
    /// The id and owner are kept; the creation time restarts so rotation
    /// policies measure the age of the new payload.
    pub fn rotated(&self, payload: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: self.id,
            user_id: self.user_id,
            payload,
            created_at: now,
            expires_at: expiry(now, lifetime),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Saturates at the last representable instant
fn expiry(now: DateTime<Utc>, lifetime: Duration) -> DateTime<Utc> {
    now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_expires_after_lifetime() {
        let user_id = Uuid::new_v4();
        let token = RefreshToken::new(user_id, "payload".to_string(), Duration::minutes(30));

        assert_eq!(token.user_id, user_id);
        assert_eq!(token.expires_at - token.created_at, Duration::minutes(30));
        assert!(!token.is_expired());
        assert!(token.is_expired_at(token.expires_at));
    }

    #[test]
    fn test_rotated_keeps_identity() {
        let mut token = RefreshToken::new(Uuid::new_v4(), "old".to_string(), Duration::minutes(30));
        token.created_at -= Duration::minutes(20);
        token.expires_at -= Duration::minutes(20);

        let rotated = token.rotated("new".to_string(), Duration::minutes(30));

        assert_eq!(rotated.id, token.id);
        assert_eq!(rotated.user_id, token.user_id);
        assert_eq!(rotated.payload, "new");
        assert!(rotated.created_at > token.created_at);
        assert!(rotated.expires_at > token.expires_at);
    }

    #[test]
    fn test_expiry_saturates_instead_of_overflowing() {
        let token = RefreshToken::new(Uuid::new_v4(), "payload".to_string(), Duration::MAX);
        assert_eq!(token.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!token.is_expired());
    }
}
