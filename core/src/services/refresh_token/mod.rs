//! Refresh token module
//!
//! Issues opaque refresh tokens, rotates them in place and revokes them per
//! token or per user.

mod service;

#[cfg(test)]
mod tests;

pub use service::{RefreshTokenService, MAX_PAYLOAD_BYTES, MIN_PAYLOAD_BYTES};
