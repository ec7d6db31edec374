//! Value objects representing immutable domain concepts.

pub mod claims;
pub mod refresh_policy;
pub mod token_package;

pub use claims::ClaimSet;
pub use refresh_policy::RefreshTokenUpdatePolicy;
pub use token_package::{IssueResult, PendingTwoFactorPackage, TokenPackage, TwoFactorState};
