//! WebSocket session lifecycle — one authenticated client from upgrade
//! through disconnect.
//!
//! Each session runs two tasks: the reader loop below, and a writer task
//! that drains the connection's outbound frame queue. Splitting the halves
//! keeps a slow or stalled peer from ever blocking the router: enqueueing is
//! non-blocking, and only the writer awaits the transport.
//!
//! Cancellation (eviction by the liveness monitor, or supersession by a
//! reconnect) tears down exactly this session; the writer answers it by
//! sending a Close frame and exiting.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use parley_core::Username;

use super::connection::{ClientConnection, OutboundFrame};
use super::router::SessionRouter;

/// Run a WebSocket session for an authenticated client.
///
/// 1. Spawns the writer task for outbound frames
/// 2. Registers with the router (join notice, roster, history fan-out)
/// 3. Dispatches inbound frames until close, error, or cancellation
/// 4. Runs the close path and stops the writer
#[instrument(skip_all, fields(username = %username))]
pub async fn run_session(
    socket: WebSocket,
    username: Username,
    router: Arc<SessionRouter>,
    queue_capacity: usize,
) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (tx, rx) = mpsc::channel::<OutboundFrame>(queue_capacity);
    let connection = Arc::new(ClientConnection::new(username, tx));
    info!(conn = %connection.id, "client connected");

    let writer = tokio::spawn(write_loop(ws_tx, rx, connection.clone()));

    router.handle_join(connection.clone()).await;

    loop {
        tokio::select! {
            () = connection.cancelled() => break,
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    router.handle_text(&connection, text.as_str()).await;
                }
                Some(Ok(Message::Binary(data))) => {
                    // Some clients ship JSON in binary frames; treat them as
                    // text when they decode.
                    match std::str::from_utf8(&data) {
                        Ok(text) => router.handle_text(&connection, text).await,
                        Err(_) => debug!(len = data.len(), "ignoring non-UTF8 binary frame"),
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Ping(_))) => {
                    connection.mark_alive();
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("client closed the connection");
                    break;
                }
                Some(Err(error)) => {
                    debug!(%error, "websocket receive error");
                    break;
                }
            }
        }
    }

    router.handle_close(&connection).await;
    connection.cancel();
    writer.abort();
    info!(conn = %connection.id, "session ended");
}

/// Drain the outbound queue into the WebSocket until the queue closes, the
/// transport fails, or the connection is cancelled.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundFrame>,
    connection: Arc<ClientConnection>,
) {
    loop {
        tokio::select! {
            () = connection.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
            frame = rx.recv() => match frame {
                Some(OutboundFrame::Text(json)) => {
                    if ws_tx.send(Message::Text((*json).clone().into())).await.is_err() {
                        break;
                    }
                }
                Some(OutboundFrame::Ping) => {
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    }
}
