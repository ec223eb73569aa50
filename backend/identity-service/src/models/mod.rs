pub mod account;
pub mod token;

pub use account::{normalize_email, Account, AccountProfile, NewAccount};
pub use token::{EphemeralToken, IssuedToken, TokenKind};
