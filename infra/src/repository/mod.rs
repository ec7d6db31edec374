//! Refresh token repository implementations

pub mod memory;

#[cfg(test)]
mod tests;

pub use memory::{MemoryRefreshTokenRepository, MemoryTokenStore};
