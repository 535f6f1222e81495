//! Liveness monitoring: periodic ping probes with forced eviction.
//!
//! The monitor is an independent task walking a point-in-time view of the
//! registry on a fixed period. Per connection and tick:
//!
//! - alive flag set (pong seen since the last tick): reset the miss counter,
//!   clear the flag, enqueue a probe. The flag is set again only by the
//!   session loop when the pong arrives.
//! - alive flag clear: count a miss; at the limit, evict — forced close,
//!   unregistration, and the same departure/roster fan-out as a graceful
//!   close.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::connection::OutboundFrame;
use super::router::SessionRouter;

/// Run liveness probing over the router's registry until cancelled.
pub async fn run_liveness_monitor(
    router: Arc<SessionRouter>,
    interval: Duration,
    missed_limit: u32,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    // Skip the immediate first tick; fresh connections get a full period
    // before their first probe.
    let _ = ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for connection in router.registry().connections().await {
                    if connection.check_alive() {
                        connection.reset_missed_probes();
                        if !connection.send_frame(OutboundFrame::Ping) {
                            debug!(username = %connection.username, "failed to enqueue liveness probe");
                        }
                    } else {
                        let missed = connection.record_missed_probe();
                        debug!(username = %connection.username, missed, "missed liveness probe");
                        if missed >= missed_limit {
                            warn!(username = %connection.username, missed, "liveness timeout");
                            router.evict(&connection).await;
                        }
                    }
                }
            }
            () = cancel.cancelled() => return,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
