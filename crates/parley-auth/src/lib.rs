//! # parley-auth
//!
//! User directory and session-token service for the Parley chat relay.
//!
//! The relay core consumes both through narrow traits and never sees the
//! implementations:
//!
//! - [`UserDirectory`]: `register` / `verify` over argon2-hashed credentials,
//!   optionally persisted to a JSON file
//! - [`TokenIssuer`] / [`TokenVerifier`]: short-lived HS256 JWTs binding a
//!   connection to a registered identity
//!
//! Token verification is pure with respect to the relay: a bad token is
//! reported as an error and never retried.

#![deny(unsafe_code)]

pub mod directory;
pub mod errors;
pub mod token;

pub use directory::{PasswordDirectory, UserDirectory};
pub use errors::AuthError;
pub use token::{JwtTokenService, TokenIssuer, TokenVerifier};
