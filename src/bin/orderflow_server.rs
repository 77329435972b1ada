use clap::Parser;
use log::info;
use orderflow::{load_node_config, OrderHttpServer, OrderNode};
use std::sync::Arc;
use tokio::sync::watch;

/// Command line options for the API server binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the node configuration file
    #[arg(long)]
    config: Option<String>,

    /// Override the HTTP bind address from the config
    #[arg(long)]
    bind: Option<String>,

    /// Override the number of in-process kitchen workers
    #[arg(long)]
    workers: Option<usize>,
}

/// Main entry point for the orderflow API server.
///
/// Starts the HTTP intake endpoint, the outbox relay, and the configured
/// number of in-process kitchen workers. The embedded queue is only
/// reachable from this process, so at least one worker is required.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    orderflow::logging::init().ok();
    info!("Starting Orderflow API server...");

    let cli = Cli::parse();

    let mut config = load_node_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(workers) = cli.workers {
        config.worker.count = workers;
    }
    config.ensure_ticket_consumers()?;
    info!("Config loaded; storage at {}", config.storage_path.display());

    let bind_address = config.bind_address.clone();
    let node = Arc::new(OrderNode::load(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay_handle = node.spawn_relay(shutdown_rx.clone());
    let worker_handles = node.spawn_workers(shutdown_rx);

    let server = OrderHttpServer::new(Arc::clone(&node), &bind_address);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            log::error!("HTTP server error: {}", e);
        }
    });

    info!("Orderflow API server is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    // Flip the flag so relay and workers exit their loops; an in-flight
    // ticket is dropped, not requeued
    let _ = shutdown_tx.send(true);
    server_handle.abort();
    relay_handle.abort();
    for handle in worker_handles {
        handle.abort();
    }

    Ok(())
}
