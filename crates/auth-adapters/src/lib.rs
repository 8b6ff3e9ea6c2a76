//! # auth-adapters
//!
//! Identity for the feed: argon2 password hashing for account storage and,
//! behind `auth-jwt`, a bearer-token implementation of `Authenticator`.

pub mod error;
pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use error::AuthError;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtAuthenticator;
