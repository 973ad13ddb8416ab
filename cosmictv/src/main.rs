mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use cosmictv_api::AppState;
use cosmictv_core::catalog::{CatalogStore, PlaylistWatcher};
use cosmictv_core::notifier::LogNotifier;
use cosmictv_core::realtime::StreamHub;
use cosmictv_core::service::{
    FileAuthenticator, InteractionStore, PresenceTracker, SessionRegistry, Sweeper,
};
use cosmictv_core::{logging, Config};

#[derive(Debug, Parser)]
#[command(name = "cosmictv", about = "CosmicTV catalog and session server")]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, env = "COSMICTV_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    // 1.5. Validate configuration (fail fast on misconfigurations)
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("CosmicTV server starting...");
    info!("HTTP address: {}", config.http_address());
    info!("Playlist directory: {}", config.channels.dir);

    if config.auth.admin_api_key.is_none() {
        warn!("No admin API key configured; admin endpoints will reject all requests");
    }

    let config = Arc::new(config);
    let ttl = Duration::from_secs(config.presence.viewer_ttl_seconds);

    // 3. Construct the in-memory state
    let catalog = Arc::new(CatalogStore::new());
    let presence = Arc::new(PresenceTracker::new(ttl));
    let interactions = Arc::new(InteractionStore::new());
    let sessions = Arc::new(SessionRegistry::new(ttl));
    let hub = Arc::new(StreamHub::new());
    let authenticator = Arc::new(FileAuthenticator::new(&config.auth.users_file));

    // 4. Start the playlist watcher (does the initial scan itself)
    let watcher = PlaylistWatcher::new(
        PathBuf::from(&config.channels.dir),
        Duration::from_secs(config.channels.watch_interval_seconds),
        catalog.clone(),
    );
    let _watcher_task = watcher.spawn();

    // 5. Start the TTL sweep
    let sweeper = Sweeper::new(
        presence.clone(),
        sessions.clone(),
        Duration::from_secs(config.presence.sweep_interval_seconds),
    );
    let _sweeper_task = sweeper.spawn();

    // 6. Optionally mirror active-session counts into the users file
    let _persist_task = if config.sessions.persist_active_counts {
        let sessions = sessions.clone();
        let users_file = PathBuf::from(&config.auth.users_file);
        let interval = Duration::from_secs(config.sessions.persist_interval_seconds);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = sessions.persist_active_counts(&users_file).await {
                    warn!("Failed to persist active session counts: {e}");
                }
            }
        }))
    } else {
        None
    };

    // 7. Assemble the API state and serve
    let state = AppState::new(
        config.clone(),
        catalog,
        presence,
        interactions,
        sessions,
        hub,
        authenticator,
        Arc::new(LogNotifier),
    );

    server::serve(config.http_address(), state).await
}
