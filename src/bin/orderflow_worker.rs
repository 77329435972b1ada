use clap::Parser;
use log::info;
use orderflow::{load_node_config, KitchenWorker, SimulatedFulfillment, SledWorkQueue, WorkQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Command line options for the kitchen worker binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the node configuration file
    #[arg(long)]
    config: Option<String>,

    /// Number of concurrent worker instances
    #[arg(long)]
    workers: Option<usize>,
}

/// Main entry point for the standalone kitchen worker process.
///
/// A pure consumer: no network port, no interactive input. It opens the
/// queue storage, blocks on the kitchen queue, and processes tickets until
/// interrupted. Restart-safe; the only state lost on restart is a ticket
/// that was in flight.
///
/// The queue storage is single-process: this binary must own the storage
/// directory exclusively, so it cannot run while the API server holds it.
/// Use it to drain a queue the server left behind; a live deployment runs
/// its workers inside the server process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    orderflow::logging::init().ok();
    info!("Starting Kitchen Order Worker...");

    let cli = Cli::parse();
    let config = load_node_config(cli.config.as_deref())?;
    let count = cli.workers.unwrap_or(config.worker.count).max(1);

    let queue: Arc<dyn WorkQueue> = match SledWorkQueue::open(&config.storage_path) {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            log::error!(
                "Cannot open queue storage at {}: {}",
                config.storage_path.display(),
                e
            );
            log::error!(
                "The queue storage is single-process. If the API server owns this \
                 directory, stop it or let it consume tickets itself by running it \
                 with in-process workers (--workers N)."
            );
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };
    info!(
        "Waiting for orders on '{}' ({} worker instance(s))",
        config.queue_name, count
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::with_capacity(count);
    for _ in 0..count {
        let fulfillment = Arc::new(SimulatedFulfillment::new(Duration::from_millis(
            config.worker.simulated_prep_millis,
        )));
        let worker = KitchenWorker::new(Arc::clone(&queue), fulfillment)
            .with_queue_name(&config.queue_name)
            .with_poll_timeout(Duration::from_secs(config.worker.poll_timeout_secs))
            .with_reconnect_backoff(Duration::from_secs(config.worker.reconnect_backoff_secs))
            .with_error_delay(Duration::from_secs(config.worker.error_delay_secs));
        handles.push(tokio::spawn(worker.run(shutdown_rx.clone())));
    }

    tokio::signal::ctrl_c().await?;
    info!("Worker stopped.");

    let _ = shutdown_tx.send(true);
    for handle in handles {
        handle.abort();
    }

    Ok(())
}
