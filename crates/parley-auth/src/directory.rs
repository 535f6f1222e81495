//! User directory: registration and credential verification.
//!
//! Credentials are argon2id PHC hashes held in memory and, when a backing
//! path is configured, mirrored to a JSON file so registrations survive a
//! restart. The file is loaded once at construction and rewritten after each
//! successful registration with owner-only permissions.
//!
//! The username charset (letters, digits, underscore) is enforced here, at
//! the registration boundary; nothing downstream re-validates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use parley_core::Username;

use crate::errors::AuthError;

/// Registration and credential verification for chat users.
pub trait UserDirectory: Send + Sync {
    /// Register a new user. Fails with [`AuthError::UsernameTaken`] if the
    /// name exists and [`AuthError::InvalidUsername`] if it fails validation.
    fn register(&self, username: &str, password: &str) -> Result<Username, AuthError>;

    /// Verify a username/password pair. Fails with
    /// [`AuthError::InvalidCredentials`] on any mismatch; unknown users and
    /// wrong passwords are indistinguishable to the caller.
    fn verify(&self, username: &str, password: &str) -> Result<Username, AuthError>;
}

/// One persisted user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    /// PHC-format argon2id hash.
    password: String,
}

/// In-memory directory with optional JSON file persistence.
pub struct PasswordDirectory {
    users: RwLock<HashMap<Username, String>>,
    backing: Option<PathBuf>,
}

impl PasswordDirectory {
    /// Create an empty, memory-only directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            backing: None,
        }
    }

    /// Open a directory backed by the JSON file at `path`.
    ///
    /// A missing file is treated as an empty directory; an unreadable or
    /// unparseable one is an error (silently dropping registered users would
    /// be worse than refusing to start).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let users = match std::fs::read_to_string(&path) {
            Ok(data) => {
                let records: Vec<UserRecord> = serde_json::from_str(&data)?;
                tracing::debug!(path = %path.display(), count = records.len(), "loaded user file");
                records
                    .into_iter()
                    .map(|r| (Username::from_trusted(r.username), r.password))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "user file not found, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            users: RwLock::new(users),
            backing: Some(path),
        })
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Rewrite the backing file from the current map.
    ///
    /// Creates parent directories if needed and tightens permissions to
    /// 0o600; the file holds password hashes.
    fn save(&self, path: &Path) -> Result<(), AuthError> {
        let records: Vec<UserRecord> = {
            let users = self.users.read();
            let mut records: Vec<UserRecord> = users
                .iter()
                .map(|(u, h)| UserRecord {
                    username: u.as_str().to_string(),
                    password: h.clone(),
                })
                .collect();
            records.sort_by(|a, b| a.username.cmp(&b.username));
            records
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        Ok(())
    }
}

impl Default for PasswordDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory for PasswordDirectory {
    fn register(&self, username: &str, password: &str) -> Result<Username, AuthError> {
        let username = Username::parse(username)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();

        {
            let mut users = self.users.write();
            if users.contains_key(&username) {
                return Err(AuthError::UsernameTaken);
            }
            let _ = users.insert(username.clone(), hash);
        }

        if let Some(ref path) = self.backing {
            self.save(path)?;
        }
        tracing::info!(%username, "user registered");
        Ok(username)
    }

    fn verify(&self, username: &str, password: &str) -> Result<Username, AuthError> {
        let users = self.users.read();
        let Some((found, hash)) = users.get_key_value(&Username::from_trusted(username.into()))
        else {
            return Err(AuthError::InvalidCredentials);
        };
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;
        Ok(found.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_verify_succeeds() {
        let dir = PasswordDirectory::new();
        let u = dir.register("alice", "hunter2").unwrap();
        assert_eq!(u.as_str(), "alice");
        assert_eq!(dir.verify("alice", "hunter2").unwrap(), u);
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let dir = PasswordDirectory::new();
        let _ = dir.register("alice", "hunter2").unwrap();
        assert!(matches!(
            dir.verify("alice", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_user_is_invalid_credentials() {
        let dir = PasswordDirectory::new();
        assert!(matches!(
            dir.verify("nobody", "anything"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_registration_conflicts() {
        let dir = PasswordDirectory::new();
        let _ = dir.register("alice", "one").unwrap();
        assert!(matches!(
            dir.register("alice", "two"),
            Err(AuthError::UsernameTaken)
        ));
        // Original credentials still work.
        assert!(dir.verify("alice", "one").is_ok());
    }

    #[test]
    fn invalid_username_is_rejected() {
        let dir = PasswordDirectory::new();
        assert!(matches!(
            dir.register("al-ice", "pw"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            dir.register("", "pw"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert_eq!(dir.user_count(), 0);
    }

    #[test]
    fn hashes_are_salted() {
        let dir = PasswordDirectory::new();
        let _ = dir.register("alice", "same-password").unwrap();
        let _ = dir.register("bob", "same-password").unwrap();
        let users = dir.users.read();
        let a = users.get(&Username::from_trusted("alice".into())).unwrap();
        let b = users.get(&Username::from_trusted("bob".into())).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = PasswordDirectory::open(tmp.path().join("users.json")).unwrap();
        assert_eq!(dir.user_count(), 0);
    }

    #[test]
    fn registrations_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.json");

        let dir = PasswordDirectory::open(&path).unwrap();
        let _ = dir.register("alice", "hunter2").unwrap();
        let _ = dir.register("bob", "swordfish").unwrap();
        drop(dir);

        let reopened = PasswordDirectory::open(&path).unwrap();
        assert_eq!(reopened.user_count(), 2);
        assert!(reopened.verify("alice", "hunter2").is_ok());
        assert!(reopened.verify("bob", "swordfish").is_ok());
        assert!(matches!(
            reopened.verify("alice", "swordfish"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PasswordDirectory::open(&path),
            Err(AuthError::Json(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn user_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("users.json");
        let dir = PasswordDirectory::open(&path).unwrap();
        let _ = dir.register("alice", "hunter2").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
