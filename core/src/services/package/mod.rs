//! Token package module
//!
//! Combines the JWT builder, refresh token service and two-factor
//! placeholder cache into the login and refresh flows.

mod provider;
mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use provider::JwtPackageProvider;
pub use traits::TwoFactorPlaceholderCache;
