//! # timerhubd - timerhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`timerhub.toml` plus environment overrides)
//! - Initialise `tracing`
//! - Construct the adapters: virtual platform, file store, audio player,
//!   MQTT publisher or the platform's publish service
//! - Build the timer card and start its tick loop
//! - Apply debounced configuration edits
//! - Bind the HTTP router and serve until SIGINT/SIGTERM, then tear the card
//!   down
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod publisher;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use timerhub_adapter_audio_command::CommandAudioPlayer;
use timerhub_adapter_http_axum::router;
use timerhub_adapter_http_axum::state::AppState;
use timerhub_adapter_mqtt::TopicMirror;
use timerhub_adapter_storage_file::FileKeyValueStore;
use timerhub_adapter_virtual::VirtualPlatform;
use timerhub_app::card::TimerCard;
use timerhub_app::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use timerhub_app::ports::publisher::ServicePublisher;
use timerhub_app::runner::{TICK_PERIOD, TickLoop, shutdown};

use crate::config::Config;
use crate::publisher::Publisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Platform
    let platform = Arc::new(
        VirtualPlatform::new()
            .with_entities(config.entities.iter().cloned())
            .with_mirror(config.card.mqtt.clone()),
    );
    tracing::info!(entities = platform.entity_ids().len(), "virtual platform ready");

    // Adapters
    let kv = Arc::new(FileKeyValueStore::open(&config.storage.data_dir).await?);
    let audio = Arc::new(CommandAudioPlayer::new(config.audio.clone()));
    let publisher = match &config.mqtt {
        Some(mqtt) => {
            let (publisher, connection) = timerhub_adapter_mqtt::connect(mqtt);
            let mirror = TopicMirror::new(config.card.mqtt.clone(), Arc::clone(&platform));
            connection.spawn(Some(mirror));
            tracing::info!(host = %mqtt.broker_host, port = mqtt.broker_port, "using MQTT broker");
            Publisher::Broker(publisher)
        }
        None => Publisher::Platform(ServicePublisher::new(Arc::clone(&platform))),
    };

    // Card
    let card = TimerCard::new(
        config.card.clone(),
        Arc::clone(&platform),
        audio,
        kv,
        Arc::new(publisher),
    )
    .shared();
    let mut ticks = TickLoop::new();
    ticks.start(Arc::clone(&card), TICK_PERIOD);

    let (debouncer, mut updates) = Debouncer::new(DEFAULT_DEBOUNCE);
    let reconfigure = tokio::spawn({
        let card = Arc::clone(&card);
        async move {
            while let Some(next) = updates.recv().await {
                card.lock().await.reconfigure(next);
            }
        }
    });

    // HTTP
    let app = router::build(AppState::new(Arc::clone(&card), Arc::new(debouncer)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "timerhubd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reconfigure.abort();
    shutdown(&mut ticks, &card).await;
    tracing::info!("timerhubd stopped");
    Ok(())
}

/// Resolve on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
