pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod spec;

pub use r#trait::{RefreshTokenRepository, UnitOfWork};
pub use spec::RefreshTokenSpec;

#[cfg(any(test, feature = "testutil"))]
pub mod mock;
#[cfg(any(test, feature = "testutil"))]
pub use mock::MockRefreshTokenRepository;
