//! Domain entities.

pub mod token;
pub mod user;

pub use token::RefreshToken;
pub use user::{Team, TokenSubject, User};
