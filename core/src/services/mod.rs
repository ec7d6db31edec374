//! Business services containing the token engine's use cases.

pub mod jwt;
pub mod keys;
pub mod package;
pub mod refresh_token;

// Re-export commonly used types
pub use jwt::{
    BuiltToken, ClaimsAssembler, DecodedToken, InvalidTokenReason, JwtBuilder, JwtValidator,
    RegisteredClaimsAdder, SubjectClaimsAssembler, ValidationOutcome,
};
pub use keys::{JsonWebKey, JsonWebKeySet, JwksExporter, KeyProvider, SigningConfiguration, SigningMode};
pub use package::{JwtPackageProvider, TwoFactorPlaceholderCache};
pub use refresh_token::RefreshTokenService;
