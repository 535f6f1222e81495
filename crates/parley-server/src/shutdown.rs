//! Graceful shutdown coordination via `CancellationToken`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long to wait for tasks to drain before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Coordinates graceful shutdown across server tasks.
///
/// Every long-lived task (the liveness monitor, the accept loop) takes a
/// child token; cancelling the coordinator signals all of them at once.
#[derive(Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signal shutdown and wait for the given tasks to finish, up to a
    /// fixed drain timeout.
    pub async fn drain(&self, handles: Vec<JoinHandle<()>>) {
        self.shutdown();
        info!(task_count = handles.len(), "waiting for tasks to drain");
        let all = futures::future::join_all(handles);
        if tokio::time::timeout(DRAIN_TIMEOUT, all).await.is_err() {
            warn!("shutdown drain timed out, some tasks may still be running");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
