//! textsync-edit-server binary entry point.
//!
//! Usage:
//! ```bash
//! textsync-edit-server --config textsync.toml
//! ```
//!
//! Hosts a session registry with its eviction task and logs the
//! edit-server event stream until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use textsync_edit_server::eviction::spawn_eviction_task;
use textsync_edit_server::telemetry::init_tracing;
use textsync_edit_server::{event_channel, Config, SessionRegistry};

#[tokio::main]
async fn main() -> textsync_edit_server::Result<()> {
    init_tracing("info");

    let path = get_config_path();
    let config = if path.exists() {
        Config::from_file(&path)?
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        Config::default()
    };

    let (events, mut rx) = event_channel();
    let registry = Arc::new(SessionRegistry::new(config.clone(), events));
    let eviction = spawn_eviction_task(Arc::clone(&registry), config.eviction.clone());

    tracing::info!(
        "textsync-edit-server v{} ready (max sessions: {})",
        env!("CARGO_PKG_VERSION"),
        config.limits.max_sessions
    );

    loop {
        tokio::select! {
            Some(event) = rx.recv() => tracing::debug!("Event: {:?}", event),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    eviction.abort();
    registry.shutdown().await;
    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("textsync.toml"))
}
