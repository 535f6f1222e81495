//! # parley-server
//!
//! Axum HTTP + WebSocket server for the Parley chat relay.
//!
//! - HTTP endpoints: registration, login, health check
//! - WebSocket gateway: token-authenticated upgrade, session routing,
//!   presence notifications, conversation history, roster fan-out
//! - Liveness monitor: periodic ping/pong probing with forced eviction of
//!   unresponsive connections
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`
//!
//! The relay state machine lives in [`websocket::router::SessionRouter`]; it
//! is explicitly constructed with its registry, history store, and token
//! verifier so tests can build isolated instances.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod http;
pub mod server;
pub mod shutdown;
pub mod websocket;
pub mod ws;

pub use config::ServerConfig;
pub use server::{AppState, ParleyServer};
