pub mod subject;
pub mod token;

pub use subject::SubjectLookup;
pub use token::{RefreshTokenRepository, RefreshTokenSpec, UnitOfWork};

#[cfg(any(test, feature = "testutil"))]
pub use token::MockRefreshTokenRepository;
