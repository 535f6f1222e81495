//! Session tokens: HS256 JWTs with a fixed expiry window.
//!
//! `issue` signs `{sub: username, iat, exp}`; `verify` checks the signature
//! and expiry and returns the subject. The relay treats verification as a
//! pure function: any failure means "reject", never "retry".

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use parley_core::Username;

use crate::errors::AuthError;

/// Default token lifetime: one hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Issues opaque credentials binding a session to an identity.
pub trait TokenIssuer: Send + Sync {
    /// Produce a fresh token for `username`.
    fn issue(&self, username: &Username) -> Result<String, AuthError>;
}

/// Validates opaque credentials and yields the identity they were issued to.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return its subject.
    fn verify(&self, token: &str) -> Result<Username, AuthError>;
}

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the username the token was issued to.
    sub: String,
    /// Issued-at (Unix seconds).
    iat: i64,
    /// Expiry (Unix seconds).
    exp: i64,
}

/// HS256 token service with a shared secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl JwtTokenService {
    /// Create a token service from a shared secret and a lifetime in seconds.
    #[must_use]
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry; the window is already generous.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }
}

impl TokenIssuer for JwtTokenService {
    fn issue(&self, username: &Username) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let claims = Claims {
            sub: username.as_str().to_string(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Sign(e.to_string()))
    }
}

impl TokenVerifier for JwtTokenService {
    fn verify(&self, token: &str) -> Result<Username, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;
        Ok(Username::from_trusted(data.claims.sub))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
