//! Settings types with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings document (`~/.parley/settings.json`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParleySettings {
    /// Network and liveness settings.
    pub server: ServerSettings,
    /// Credential and token settings.
    pub auth: AuthSettings,
}

/// Server network and liveness settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Liveness probe period in seconds.
    pub heartbeat_interval_secs: u64,
    /// Consecutive missed probes before a connection is evicted.
    pub missed_probe_limit: u32,
    /// Per-connection outbound queue capacity (frames).
    pub send_queue_capacity: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            heartbeat_interval_secs: 5,
            missed_probe_limit: 3,
            send_queue_capacity: 256,
            max_message_size: 64 * 1024,
        }
    }
}

/// Credential and token settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// HMAC secret for session tokens. The compiled default is for local
    /// development only; override it via `PARLEY_TOKEN_SECRET` in any real
    /// deployment.
    pub token_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Path to the persisted user file. Empty disables persistence.
    pub users_file: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_secret: "parley-dev-secret".to_string(),
            token_ttl_secs: 3600,
            users_file: String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
