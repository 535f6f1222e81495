//! # parley-relay
//!
//! Parley chat relay server binary — wires the settings, the user directory,
//! the token service, and the relay server together and runs until
//! interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use parley_auth::{JwtTokenService, PasswordDirectory, UserDirectory};
use parley_server::{ParleyServer, ServerConfig};
use parley_settings::ParleySettings;

/// Parley chat relay server.
#[derive(Parser, Debug)]
#[command(name = "parley-relay", about = "Parley chat relay server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default `~/.parley/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Path to the persisted user file (overrides settings; omit along with
    /// the setting for a memory-only directory).
    #[arg(long)]
    users_file: Option<PathBuf>,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn load_settings(cli: &Cli) -> Result<ParleySettings> {
    let mut settings = match cli.settings {
        Some(ref path) => parley_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => parley_settings::load_settings().context("failed to load settings")?,
    };
    if let Some(ref host) = cli.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(ref path) = cli.users_file {
        settings.auth.users_file = path.display().to_string();
    }
    Ok(settings)
}

fn build_directory(settings: &ParleySettings) -> Result<Arc<dyn UserDirectory>> {
    if settings.auth.users_file.is_empty() {
        info!("user directory is memory-only");
        Ok(Arc::new(PasswordDirectory::new()))
    } else {
        let path = PathBuf::from(&settings.auth.users_file);
        let directory = PasswordDirectory::open(&path)
            .with_context(|| format!("failed to open user file {}", path.display()))?;
        info!(path = %path.display(), users = directory.user_count(), "user directory loaded");
        Ok(Arc::new(directory))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let directory = build_directory(&settings)?;
    let tokens = Arc::new(JwtTokenService::new(
        &settings.auth.token_secret,
        settings.auth.token_ttl_secs,
    ));

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        heartbeat_interval_secs: settings.server.heartbeat_interval_secs,
        missed_probe_limit: settings.server.missed_probe_limit,
        send_queue_capacity: settings.server.send_queue_capacity,
        max_message_size: settings.server.max_message_size,
    };

    let server = ParleyServer::new(config, directory, tokens.clone(), tokens);
    let monitor = server.spawn_monitor();

    let addr = format!("{}:{}", server.config().host, server.config().port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "relay listening");

    let shutdown = server.shutdown().clone();
    let signal_shutdown = shutdown.clone();
    axum::serve(listener, server.router())
        .with_graceful_shutdown(async move {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
            signal_shutdown.shutdown();
        })
        .await
        .context("server error")?;

    shutdown.drain(vec![monitor]).await;
    info!("relay stopped");
    Ok(())
}
