//! # parley-core
//!
//! Foundation types for the Parley chat relay.
//!
//! This crate provides the shared vocabulary the server crates depend on:
//!
//! - **Identity**: [`Username`] newtype with registration-time validation
//! - **Wire envelopes**: [`ClientEvent`] / [`ServerEvent`] tagged enums
//!   matching the JSON protocol spoken by clients
//! - **Conversation keys**: [`ConversationKey`] — the global channel or a
//!   canonical, order-independent two-party key
//! - **History**: [`HistoryStore`] — append-only in-memory logs per
//!   conversation, alive for the process lifetime
//!
//! No I/O happens here; everything is plain data plus a lock.

#![deny(unsafe_code)]

pub mod conversation;
pub mod envelope;
pub mod errors;
pub mod history;
pub mod identity;

pub use conversation::ConversationKey;
pub use envelope::{ChatMessage, ChatScope, ClientEvent, ServerEvent};
pub use errors::CoreError;
pub use history::HistoryStore;
pub use identity::Username;
