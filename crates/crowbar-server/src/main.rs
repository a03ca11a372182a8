use crowbar_server::transport::{LoopbackTransport, TransportEvent};
use crowbar_server::{handlers, tick, ServerConfig, World};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Crowbar server...");

    let config = ServerConfig::load(Path::new("config/server.toml"))?;
    info!(
        "Config loaded: bind={}:{}, max_players={}, tick_rate={}",
        config.bind, config.port, config.max_players, config.tick_rate
    );

    // The wire transport is pluggable; the stock binary runs on the
    // in-process loopback until one is wired in.
    let transport = Box::new(LoopbackTransport::new());
    let mut world = World::new(config, transport);
    handlers::register(&mut world);

    let (_event_tx, event_rx) =
        mpsc::channel::<TransportEvent>(crowbar_server::transport::INBOUND_QUEUE_DEPTH);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    tick::run_tick_loop(&mut world, event_rx, shutdown_rx).await;

    info!("Server shut down cleanly");
    Ok(())
}
