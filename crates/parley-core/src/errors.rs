//! Core error types.

use thiserror::Error;

/// Errors produced by core domain types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Username is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid username {0:?}: only letters, digits, and underscore are allowed")]
    InvalidUsername(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
