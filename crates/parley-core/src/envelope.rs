//! Wire-format envelopes for the chat protocol.
//!
//! Client -> Server (JSON, tagged by `type`):
//! ```json
//! {"type": "message", "chatType": "global", "username": "alice", "text": "hi"}
//! {"type": "message", "chatType": "private", "username": "alice", "recipient": "bob", "text": "hey"}
//! {"type": "chatHistory", "username": "alice", "recipient": "bob", "token": "<jwt>"}
//! ```
//!
//! Server -> Client (JSON, tagged by `type`):
//! ```json
//! {"type": "notification", "text": "alice joined the chat", "username": "alice"}
//! {"type": "message", "chatType": "global", "username": "alice", "text": "hi"}
//! {"type": "chatHistory", "chatType": "global", "messages": [...]}
//! {"type": "users", "users": ["alice", "bob"]}
//! ```
//!
//! Unknown inbound `type` tags deserialize to [`ClientEvent::Unknown`] so the
//! router can ignore them without tearing down the connection.

use serde::{Deserialize, Serialize};

use crate::identity::Username;

/// Scope of a chat message: the shared global channel or a two-party
/// conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    /// Visible to every connected user.
    Global,
    /// Visible to sender and recipient only.
    Private,
}

/// A chat message as carried on the wire and stored in history.
///
/// Immutable once recorded; the router appends a copy to exactly one history
/// log and fans the same value out to recipients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Conversation scope.
    #[serde(rename = "chatType")]
    pub scope: ChatScope,
    /// Sender identity as claimed by the client.
    pub username: Username,
    /// Message body.
    pub text: String,
    /// Target identity; present for private messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Username>,
}

/// Inbound event from a connected client.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// A chat message for the global channel or a private conversation.
    #[serde(rename = "message")]
    Message(ChatMessage),

    /// Request for the history of a two-party conversation.
    ///
    /// The token is re-verified on every request; its subject must equal the
    /// claimed `username` or the request is dropped.
    #[serde(rename = "chatHistory")]
    ChatHistory {
        /// Identity the requester claims to be.
        username: Username,
        /// The other party of the conversation.
        recipient: Username,
        /// Credential proving the claimed identity.
        token: String,
    },

    /// Any unrecognized event kind; dropped by the router.
    #[serde(other)]
    Unknown,
}

/// Outbound event to one or more clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Presence or system notice.
    #[serde(rename = "notification")]
    Notification {
        /// Human-readable notice text.
        text: String,
        /// Subject of the notice, when it concerns a specific user. Clients
        /// use this to suppress notices about themselves.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<Username>,
    },

    /// A chat message relayed to its recipients, echoing the sender's fields.
    #[serde(rename = "message")]
    Message(ChatMessage),

    /// Snapshot of one conversation's full history.
    #[serde(rename = "chatHistory")]
    ChatHistory {
        /// Which conversation the snapshot belongs to.
        #[serde(rename = "chatType")]
        scope: ChatScope,
        /// The other party, for private snapshots.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient: Option<Username>,
        /// The log in insertion order.
        messages: Vec<ChatMessage>,
    },

    /// Roster of currently connected users.
    #[serde(rename = "users")]
    Users {
        /// Connected identities, sorted for stable display.
        users: Vec<Username>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
