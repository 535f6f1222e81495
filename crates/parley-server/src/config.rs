//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            heartbeat_interval_secs: 5,
            missed_probe_limit: 3,
            send_queue_capacity: 256,
            max_message_size: 64 * 1024,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.heartbeat_interval_secs, 5);
        assert_eq!(cfg.missed_probe_limit, 3);
        assert_eq!(cfg.send_queue_capacity, 256);
        assert_eq!(cfg.max_message_size, 64 * 1024);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 5000,
            heartbeat_interval_secs: 10,
            missed_probe_limit: 5,
            send_queue_capacity: 64,
            max_message_size: 1024,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.missed_probe_limit, cfg.missed_probe_limit);
    }
}
