//! The `Username` identity newtype.
//!
//! A username is the stable handle for a registered user; it is carried in
//! every message and keys the connection registry. Wrapping it in a newtype
//! prevents accidentally passing a token or a message body where an identity
//! is expected.
//!
//! Validation happens once, at registration time, via [`Username::parse`].
//! Deserialization is transparent and does **not** validate: inbound
//! envelopes carry whatever the client claimed, and the router decides what
//! to trust.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Unique string handle for a registered user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    ///
    /// Accepts non-empty ASCII strings of letters, digits, and underscore.
    /// The restricted charset guarantees a hyphen never appears inside an
    /// identity, which is what makes the hyphen-joined conversation key
    /// unambiguous.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::InvalidUsername(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Construct from an already-trusted string without validation.
    ///
    /// Used when rehydrating identities that were validated at registration
    /// (e.g. token subjects, persisted user records).
    #[must_use]
    pub fn from_trusted(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Username {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_letters_digits_underscore() {
        assert!(Username::parse("alice").is_ok());
        assert!(Username::parse("Alice_99").is_ok());
        assert!(Username::parse("_").is_ok());
        assert!(Username::parse("a1b2c3").is_ok());
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(Username::parse("").is_err());
    }

    #[test]
    fn parse_rejects_hyphen() {
        // A hyphen inside a username would make pair keys ambiguous.
        assert!(Username::parse("al-ice").is_err());
    }

    #[test]
    fn parse_rejects_spaces_and_punctuation() {
        assert!(Username::parse("al ice").is_err());
        assert!(Username::parse("alice!").is_err());
        assert!(Username::parse("a.b").is_err());
    }

    #[test]
    fn parse_rejects_non_ascii() {
        assert!(Username::parse("ålice").is_err());
    }

    #[test]
    fn display_and_as_str() {
        let u = Username::parse("bob").unwrap();
        assert_eq!(u.to_string(), "bob");
        assert_eq!(u.as_str(), "bob");
    }

    #[test]
    fn serde_is_transparent() {
        let u = Username::parse("carol").unwrap();
        let json = serde_json::to_string(&u).unwrap();
        assert_eq!(json, "\"carol\"");
        let back: Username = serde_json::from_str(&json).unwrap();
        assert_eq!(back, u);
    }

    #[test]
    fn deserialization_does_not_validate() {
        // Inbound envelopes carry claimed names; validation is the
        // registration endpoint's job.
        let odd: Username = serde_json::from_str("\"not valid!\"").unwrap();
        assert_eq!(odd.as_str(), "not valid!");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Username::parse("alice").unwrap();
        let b = Username::parse("bob").unwrap();
        assert!(a < b);
    }
}
