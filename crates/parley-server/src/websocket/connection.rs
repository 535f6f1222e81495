//! Per-client connection state.
//!
//! A `ClientConnection` is the registry's handle to one live WebSocket: the
//! authenticated identity, a bounded channel into the connection's writer
//! task, and the liveness bookkeeping the monitor reads.
//!
//! Sends are non-blocking: a full queue drops the frame and counts it, so a
//! stalled consumer can never hold up a broadcast. A send into a closed
//! channel cancels the connection, which tears the session down through the
//! normal close path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use parley_core::Username;

/// A frame queued for the connection's writer task.
#[derive(Clone, Debug)]
pub enum OutboundFrame {
    /// A serialized JSON event; shared so broadcasts serialize once.
    Text(Arc<String>),
    /// A liveness probe.
    Ping,
}

/// Represents a connected, authenticated WebSocket client.
pub struct ClientConnection {
    /// Authenticated identity; keys the registry.
    pub username: Username,
    /// Unique connection ID, distinguishing reconnects in logs.
    pub id: String,
    /// Send channel to the client's WebSocket writer task.
    tx: mpsc::Sender<OutboundFrame>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has answered the most recent probe.
    is_alive: AtomicBool,
    /// Consecutive probes the client has failed to answer.
    missed_probes: AtomicU32,
    /// Count of frames dropped due to a full queue.
    dropped_frames: AtomicU64,
    /// Cancelled to force this connection closed.
    cancel: CancellationToken,
}

impl ClientConnection {
    /// Create a new connection handle for `username`.
    pub fn new(username: Username, tx: mpsc::Sender<OutboundFrame>) -> Self {
        Self {
            username,
            id: uuid::Uuid::now_v7().to_string(),
            tx,
            connected_at: Instant::now(),
            is_alive: AtomicBool::new(true),
            missed_probes: AtomicU32::new(0),
            dropped_frames: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Enqueue a frame for the writer task.
    ///
    /// Returns `false` without blocking if the queue is full (frame dropped
    /// and counted) or closed (connection cancelled).
    pub fn send_frame(&self, frame: OutboundFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(_)) => {
                // Writer is gone; treat the transport as closed.
                self.cancel.cancel();
                false
            }
        }
    }

    /// Enqueue a serialized event.
    pub fn send_text(&self, json: Arc<String>) -> bool {
        self.send_frame(OutboundFrame::Text(json))
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (probe answered).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
    }

    /// Check and clear the alive flag.
    ///
    /// Returns `true` if the connection was alive since the last check; the
    /// flag is cleared either way and set again only by [`mark_alive`].
    ///
    /// [`mark_alive`]: Self::mark_alive
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Record one missed probe; returns the new consecutive-miss count.
    pub fn record_missed_probe(&self) -> u32 {
        self.missed_probes.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reset the consecutive-miss count after an answered probe.
    pub fn reset_missed_probes(&self) {
        self.missed_probes.store(0, Ordering::Relaxed);
    }

    /// Current consecutive-miss count.
    pub fn missed_probes(&self) -> u32 {
        self.missed_probes.load(Ordering::Relaxed)
    }

    /// Force this connection closed. Idempotent; only this connection's
    /// session and writer observe the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Completes when the connection has been cancelled.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Whether this connection has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("username", &self.username)
            .field("id", &self.id)
            .field("missed_probes", &self.missed_probes())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Username;

    fn make_connection(cap: usize) -> (ClientConnection, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(cap);
        let conn = ClientConnection::new(Username::parse("alice").unwrap(), tx);
        (conn, rx)
    }

    #[test]
    fn new_connection_starts_alive() {
        let (conn, _rx) = make_connection(8);
        assert_eq!(conn.username.as_str(), "alice");
        assert_eq!(conn.missed_probes(), 0);
        assert!(!conn.is_cancelled());
        assert!(conn.check_alive());
    }

    #[tokio::test]
    async fn send_text_reaches_the_writer() {
        let (conn, mut rx) = make_connection(8);
        assert!(conn.send_text(Arc::new("{\"type\":\"users\"}".into())));
        match rx.recv().await.unwrap() {
            OutboundFrame::Text(json) => assert_eq!(&*json, "{\"type\":\"users\"}"),
            OutboundFrame::Ping => panic!("expected text frame"),
        }
    }

    #[tokio::test]
    async fn full_queue_drops_and_counts() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.send_frame(OutboundFrame::Ping));
        assert!(!conn.send_frame(OutboundFrame::Ping));
        assert!(!conn.send_text(Arc::new("x".into())));
        assert_eq!(conn.drop_count(), 2);
        // A full queue is back-pressure, not a dead transport.
        assert!(!conn.is_cancelled());
    }

    #[tokio::test]
    async fn closed_channel_cancels_the_connection() {
        let (tx, rx) = mpsc::channel(8);
        let conn = ClientConnection::new(Username::parse("bob").unwrap(), tx);
        drop(rx);
        assert!(!conn.send_frame(OutboundFrame::Ping));
        assert!(conn.is_cancelled());
    }

    #[test]
    fn check_alive_clears_the_flag() {
        let (conn, _rx) = make_connection(8);
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn missed_probe_counter_accumulates_and_resets() {
        let (conn, _rx) = make_connection(8);
        assert_eq!(conn.record_missed_probe(), 1);
        assert_eq!(conn.record_missed_probe(), 2);
        assert_eq!(conn.record_missed_probe(), 3);
        conn.reset_missed_probes();
        assert_eq!(conn.missed_probes(), 0);
    }

    #[tokio::test]
    async fn cancellation_is_observable_and_idempotent() {
        let (conn, _rx) = make_connection(8);
        conn.cancel();
        conn.cancel();
        assert!(conn.is_cancelled());
        // Future resolves immediately once cancelled.
        conn.cancelled().await;
    }

    #[test]
    fn connection_ids_are_unique() {
        let (a, _rx_a) = make_connection(1);
        let (b, _rx_b) = make_connection(1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn debug_output_names_the_user() {
        let (conn, _rx) = make_connection(1);
        let debug = format!("{conn:?}");
        assert!(debug.contains("alice"));
    }
}
