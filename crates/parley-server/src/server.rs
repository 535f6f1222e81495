//! `ParleyServer` — axum HTTP + WebSocket relay server.
//!
//! The composition root hands in the external collaborators (user directory,
//! token issuer/verifier); the server constructs the relay state it owns
//! (registry, history, session router) so every instance is fully isolated —
//! tests build fresh servers with fake collaborators and never touch
//! process-global state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use parley_auth::{TokenIssuer, TokenVerifier, UserDirectory};
use parley_core::HistoryStore;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::http::{login_handler, register_handler};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::monitor::run_liveness_monitor;
use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::router::SessionRouter;
use crate::ws::ws_handler;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The relay state machine.
    pub router: Arc<SessionRouter>,
    /// Verifies upgrade credentials.
    pub verifier: Arc<dyn TokenVerifier>,
    /// Registers and verifies users.
    pub directory: Arc<dyn UserDirectory>,
    /// Issues login tokens.
    pub issuer: Arc<dyn TokenIssuer>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
}

/// The Parley relay server.
pub struct ParleyServer {
    state: AppState,
}

impl ParleyServer {
    /// Create a server over the given collaborators.
    pub fn new(
        config: ServerConfig,
        directory: Arc<dyn UserDirectory>,
        issuer: Arc<dyn TokenIssuer>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let history = Arc::new(HistoryStore::new());
        let router = Arc::new(SessionRouter::new(registry, history, verifier.clone()));

        let state = AppState {
            router,
            verifier,
            directory,
            issuer,
            config: Arc::new(config),
            start_time: Instant::now(),
            shutdown: Arc::new(ShutdownCoordinator::new()),
        };
        Self { state }
    }

    /// Build the axum router with all routes and middleware.
    ///
    /// CORS is permissive: the relay is meant to sit behind whatever origin
    /// serves the chat client.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/register", post(register_handler))
            .route("/login", post(login_handler))
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Spawn the liveness monitor; it runs until shutdown.
    pub fn spawn_monitor(&self) -> JoinHandle<()> {
        tokio::spawn(run_liveness_monitor(
            self.state.router.clone(),
            Duration::from_secs(self.state.config.heartbeat_interval_secs),
            self.state.config.missed_probe_limit,
            self.state.shutdown.token(),
        ))
    }

    /// The relay state machine.
    pub fn session_router(&self) -> &Arc<SessionRouter> {
        &self.state.router
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.router.registry().count().await;
    Json(health::health_check(state.start_time, connections))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
