//! Test support: RSA fixtures and in-memory collaborators

pub mod fixtures;

use idp_shared::{JwtSettings, KeyPairSettings};

pub use crate::repositories::token::mock::MockRefreshTokenRepository;
pub use crate::services::package::mock::MockPlaceholderCache;

/// Issuer used by test settings
pub const TEST_ISSUER: &str = "https://id.test.local";

/// 32 character HMAC secret
pub const TEST_SYMMETRIC_KEY: &str = "test-symmetric-key-0123456789abc";

pub fn primary_pem_pair() -> KeyPairSettings {
    KeyPairSettings::pem(fixtures::PRIMARY_PUBLIC_PEM, fixtures::PRIMARY_PRIVATE_PEM)
}

pub fn secondary_pem_pair() -> KeyPairSettings {
    KeyPairSettings::pem(fixtures::SECONDARY_PUBLIC_PEM, fixtures::SECONDARY_PRIVATE_PEM)
}

/// Asymmetric settings signing with the primary fixture key
pub fn asymmetric_settings() -> JwtSettings {
    JwtSettings::new(TEST_ISSUER).with_current_key_pair(primary_pem_pair())
}

/// Symmetric settings with [`TEST_SYMMETRIC_KEY`]
pub fn symmetric_settings() -> JwtSettings {
    JwtSettings::new(TEST_ISSUER).with_symmetric_key(TEST_SYMMETRIC_KEY)
}
