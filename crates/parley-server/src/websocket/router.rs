//! The session router: the relay's central state machine.
//!
//! Owns the connection registry and history store, consumes inbound events
//! from session loops, and decides what to broadcast or unicast. All
//! presence, roster, and history fan-out happens here.
//!
//! Failure policy: everything is isolated to the offending connection or
//! event. Malformed payloads and unknown event kinds are dropped with a log
//! line; they never close the connection. History requests re-verify their
//! token on every request and are dropped silently on any mismatch, so an
//! unverified caller can never see another conversation.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use parley_auth::TokenVerifier;
use parley_core::{
    ChatMessage, ChatScope, ClientEvent, ConversationKey, HistoryStore, ServerEvent, Username,
};

use super::connection::ClientConnection;
use super::registry::ConnectionRegistry;

/// Central state machine for connected sessions.
pub struct SessionRouter {
    registry: Arc<ConnectionRegistry>,
    history: Arc<HistoryStore>,
    verifier: Arc<dyn TokenVerifier>,
}

impl SessionRouter {
    /// Create a router over injected state.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        history: Arc<HistoryStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            registry,
            history,
            verifier,
        }
    }

    /// The registry this router owns.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The history store this router owns.
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Admit an authenticated connection.
    ///
    /// Registers it (cancelling any superseded connection for the same
    /// identity), announces the join, and fans out the roster and the global
    /// history. Clients filter the join notice about themselves; the server
    /// does not exclude the joiner from the broadcast.
    #[instrument(skip_all, fields(username = %connection.username, conn = %connection.id))]
    pub async fn handle_join(&self, connection: Arc<ClientConnection>) {
        let username = connection.username.clone();
        if let Some(superseded) = self.registry.register(connection).await {
            info!(old_conn = %superseded.id, "reconnect supersedes previous connection");
            superseded.cancel();
        }
        info!("client joined");

        self.broadcast(&ServerEvent::Notification {
            text: format!("{username} joined the chat"),
            username: Some(username),
        })
        .await;
        self.broadcast_roster().await;

        // The whole global log goes to every client on each join, not just
        // the joiner; connected clients are expected to replace their view.
        let messages = self.history.get(&ConversationKey::Global);
        self.broadcast(&ServerEvent::ChatHistory {
            scope: ChatScope::Global,
            recipient: None,
            messages,
        })
        .await;
    }

    /// Handle one inbound text frame from an active connection.
    #[instrument(skip_all, fields(username = %connection.username))]
    pub async fn handle_text(&self, connection: &Arc<ClientConnection>, text: &str) {
        let event: ClientEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(error) => {
                debug!(%error, "dropping malformed event");
                return;
            }
        };

        match event {
            ClientEvent::Message(message) => self.handle_chat(message).await,
            ClientEvent::ChatHistory {
                username,
                recipient,
                token,
            } => {
                self.handle_history_request(connection, username, recipient, &token)
                    .await;
            }
            ClientEvent::Unknown => {
                debug!("ignoring unknown event kind");
            }
        }
    }

    /// Route a chat message to its conversation log and recipients.
    async fn handle_chat(&self, message: ChatMessage) {
        match message.scope {
            ChatScope::Global => {
                self.history
                    .append(ConversationKey::Global, message.clone());
                self.broadcast(&ServerEvent::Message(message)).await;
            }
            ChatScope::Private => {
                let Some(recipient) = message.recipient.clone() else {
                    debug!("dropping private message without recipient");
                    return;
                };
                let sender = message.username.clone();
                self.history.append(
                    ConversationKey::pair(sender.clone(), recipient.clone()),
                    message.clone(),
                );

                let Some(json) = encode(&ServerEvent::Message(message)) else {
                    return;
                };
                // Sender and recipient each get the message exactly once
                // (sender == recipient is disallowed by convention).
                let mut targets = vec![sender];
                if !targets.contains(&recipient) {
                    targets.push(recipient);
                }
                for target in targets {
                    if let Some(conn) = self.registry.lookup(&target).await {
                        if !conn.send_text(json.clone()) {
                            warn!(username = %conn.username, "failed to enqueue private message");
                        }
                    }
                }
            }
        }
    }

    /// Answer a history request, re-verifying the caller's token first.
    ///
    /// The snapshot goes back to the requesting connection only. On any
    /// verification failure the request is dropped without a reply; the
    /// caller learns nothing.
    async fn handle_history_request(
        &self,
        connection: &Arc<ClientConnection>,
        claimed: Username,
        recipient: Username,
        token: &str,
    ) {
        match self.verifier.verify(token) {
            Ok(subject) if subject == claimed => {
                let key = ConversationKey::pair(claimed, recipient.clone());
                let messages = self.history.get(&key);
                let event = ServerEvent::ChatHistory {
                    scope: ChatScope::Private,
                    recipient: Some(recipient),
                    messages,
                };
                if let Some(json) = encode(&event) {
                    let _ = connection.send_text(json);
                }
            }
            Ok(subject) => {
                warn!(claimed = %claimed, subject = %subject, "history request identity mismatch, dropping");
            }
            Err(error) => {
                warn!(claimed = %claimed, %error, "history request with invalid token, dropping");
            }
        }
    }

    /// Tear down a connection that closed gracefully.
    ///
    /// Announces the departure and the new roster. A superseded connection
    /// (already replaced in the registry) cleans up silently.
    #[instrument(skip_all, fields(username = %connection.username, conn = %connection.id))]
    pub async fn handle_close(&self, connection: &Arc<ClientConnection>) {
        if self.registry.unregister_exact(connection).await {
            info!("client disconnected");
            self.broadcast(&ServerEvent::Notification {
                text: format!("{} left the chat", connection.username),
                username: None,
            })
            .await;
            self.broadcast_roster().await;
        }
    }

    /// Forcibly evict an unresponsive connection.
    ///
    /// Cancels its transport and runs the same cleanup as a graceful close,
    /// with the departure notice worded for a drop rather than a leave.
    #[instrument(skip_all, fields(username = %connection.username, conn = %connection.id))]
    pub async fn evict(&self, connection: &Arc<ClientConnection>) {
        connection.cancel();
        if self.registry.unregister_exact(connection).await {
            warn!("evicted unresponsive client");
            self.broadcast(&ServerEvent::Notification {
                text: format!("{} disconnected.", connection.username),
                username: None,
            })
            .await;
            self.broadcast_roster().await;
        }
    }

    /// Fan an event out to every registered connection.
    pub async fn broadcast(&self, event: &ServerEvent) {
        let Some(json) = encode(event) else { return };
        for conn in self.registry.connections().await {
            if !conn.send_text(json.clone()) {
                warn!(username = %conn.username, dropped = conn.drop_count(), "failed to enqueue broadcast frame");
            }
        }
    }

    /// Broadcast the current roster.
    async fn broadcast_roster(&self) {
        let users = self.registry.snapshot().await;
        self.broadcast(&ServerEvent::Users { users }).await;
    }
}

/// Serialize an event once for fan-out.
fn encode(event: &ServerEvent) -> Option<Arc<String>> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::new(json)),
        Err(error) => {
            tracing::error!(%error, "failed to serialize outbound event");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
