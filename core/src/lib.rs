//! # IdP Core
//!
//! Token and key engine of the identity platform.
//! This crate contains RSA key handling, JWT issuance and validation,
//! refresh-token lifecycle management and the login package flow, along
//! with the repository interfaces and error types they depend on.

pub mod crypto;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-export commonly used types for convenience
pub use crypto::{AsymmetricKeyPair, KeyHelper, KeyId, KeyIdBuilder};
pub use domain::{
    ClaimSet, IssueResult, PendingTwoFactorPackage, RefreshToken, RefreshTokenUpdatePolicy, Team,
    TokenPackage, TokenSubject, TwoFactorState, User,
};
pub use errors::{DomainError, DomainResult, KeyError, SetupError, TokenError};
pub use repositories::{RefreshTokenRepository, RefreshTokenSpec, SubjectLookup, UnitOfWork};
pub use services::*;
