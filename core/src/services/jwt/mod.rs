//! JWT module
//!
//! This module handles access token construction and validation:
//! - Claim assembly and registered-claim insertion
//! - Signing with the current symmetric or asymmetric key
//! - Tri-state validation against current and legacy keys

mod builder;
mod claims;
mod validator;

#[cfg(test)]
mod tests;

pub use builder::{BuiltToken, JwtBuilder};
pub use claims::{ClaimsAssembler, RegisteredClaimsAdder, SubjectClaimsAssembler};
pub use validator::{DecodedToken, InvalidTokenReason, JwtValidator, ValidationOutcome};
