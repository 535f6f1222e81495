//! Auth error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username/password pair did not match a registered user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with a name that is already taken.
    #[error("username already exists")]
    UsernameTaken,

    /// Username failed registration-time validation.
    #[error(transparent)]
    InvalidUsername(#[from] parley_core::CoreError),

    /// Token failed signature or structural validation.
    #[error("invalid token")]
    InvalidToken,

    /// Token was well-formed but past its expiry window.
    #[error("token expired")]
    TokenExpired,

    /// Password hashing or hash parsing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Sign(String),

    /// File I/O error while loading or saving the user file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
