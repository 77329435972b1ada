//! Outbox relay: closes the store-commit / queue-publish dual-write gap.
//!
//! The intake service persists every ticket as an outbox row inside the
//! order transaction. This relay scans un-relayed rows in commit order,
//! pushes them to the work queue, and marks each row relayed only after the
//! publish is confirmed. A queue outage therefore delays delivery instead
//! of losing tickets.

use crate::constants::KITCHEN_QUEUE;
use crate::db_operations::DbOperations;
use crate::error::OrderFlowResult;
use crate::queue::WorkQueue;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const RELAY_BATCH: usize = 64;

/// How long relayed rows are kept before pruning.
const PRUNE_AFTER_HOURS: i64 = 24;

pub struct OutboxRelay {
    db: DbOperations,
    queue: Arc<dyn WorkQueue>,
    queue_name: String,
    poll_interval: Duration,
}

impl OutboxRelay {
    pub fn new(db: DbOperations, queue: Arc<dyn WorkQueue>) -> Self {
        Self {
            db,
            queue,
            queue_name: KITCHEN_QUEUE.to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_queue_name(mut self, queue_name: &str) -> Self {
        self.queue_name = queue_name.to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until the shutdown flag flips. Relay failures are logged and
    /// retried on the next tick; nothing here is fatal.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Outbox relay started for queue '{}' (poll interval {:?})",
            self.queue_name, self.poll_interval
        );
        while !*shutdown.borrow() {
            match self.drain_once().await {
                Ok(0) => {}
                Ok(relayed) => info!("Outbox relay delivered {} pending ticket(s)", relayed),
                Err(e) => warn!("Outbox relay pass failed: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        info!("Outbox relay stopped");
    }

    /// One relay pass: push every pending row, oldest first, stopping at
    /// the first queue failure so ordering is preserved across retries.
    pub async fn drain_once(&self) -> OrderFlowResult<usize> {
        let mut relayed = 0;
        loop {
            let pending = self.db.unrelayed_outbox_entries(RELAY_BATCH)?;
            if pending.is_empty() {
                break;
            }
            for entry in &pending {
                let payload = serde_json::to_vec(&entry.ticket)?;
                match self.queue.push(&self.queue_name, &payload).await {
                    Ok(_) => {
                        self.db.mark_outbox_relayed(entry.seq)?;
                        debug!(
                            "Relayed ticket for order #{} (outbox seq {})",
                            entry.ticket.order_number, entry.seq
                        );
                        relayed += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Queue rejected outbox entry {}: {}; will retry",
                            entry.seq, e
                        );
                        return Ok(relayed);
                    }
                }
            }
            if pending.len() < RELAY_BATCH {
                break;
            }
        }

        let cutoff = chrono::Utc::now() - chrono::Duration::hours(PRUNE_AFTER_HOURS);
        let pruned = self.db.prune_relayed_outbox(cutoff)?;
        if pruned > 0 {
            debug!("Pruned {} relayed outbox row(s)", pruned);
        }
        Ok(relayed)
    }
}
