//! Kitchen worker: a long-running consumer of the kitchen ticket queue.
//!
//! The worker alternates between two states: Waiting (blocked in `pop`) and
//! Processing (handling one dequeued ticket). A pop timeout just loops; a
//! queue connectivity failure backs off for a fixed interval; a bad ticket
//! is logged and skipped. Nothing a single ticket does can bring the worker
//! down.

use crate::constants::{
    DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_PROCESSING_ERROR_DELAY_SECS,
    DEFAULT_RECONNECT_BACKOFF_SECS, KITCHEN_QUEUE,
};
use crate::error::OrderFlowResult;
use crate::orders::Ticket;
use crate::queue::WorkQueue;
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// The fulfillment seam.
///
/// The shipped implementation only simulates kitchen work; a real
/// deployment would print a ticket or drive a kitchen display here. This is
/// also where a status write-back into the order store would hook in.
#[async_trait]
pub trait FulfillmentHandler: Send + Sync {
    async fn process(&self, ticket: &Ticket) -> OrderFlowResult<()>;
}

/// Stand-in for ticket printing / kitchen display updates: a fixed delay.
pub struct SimulatedFulfillment {
    duration: Duration,
}

impl SimulatedFulfillment {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for SimulatedFulfillment {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl FulfillmentHandler for SimulatedFulfillment {
    async fn process(&self, ticket: &Ticket) -> OrderFlowResult<()> {
        info!(
            "Preparing order #{} ({} item(s))...",
            ticket.order_number,
            ticket.items.len()
        );
        tokio::time::sleep(self.duration).await;
        info!("Order #{} done", ticket.order_number);
        Ok(())
    }
}

/// One consumer instance. Several may run against the same queue name; the
/// queue's atomic pop hands each ticket to exactly one of them.
pub struct KitchenWorker {
    queue: Arc<dyn WorkQueue>,
    handler: Arc<dyn FulfillmentHandler>,
    queue_name: String,
    poll_timeout: Duration,
    reconnect_backoff: Duration,
    error_delay: Duration,
}

impl KitchenWorker {
    pub fn new(queue: Arc<dyn WorkQueue>, handler: Arc<dyn FulfillmentHandler>) -> Self {
        Self {
            queue,
            handler,
            queue_name: KITCHEN_QUEUE.to_string(),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            reconnect_backoff: Duration::from_secs(DEFAULT_RECONNECT_BACKOFF_SECS),
            error_delay: Duration::from_secs(DEFAULT_PROCESSING_ERROR_DELAY_SECS),
        }
    }

    pub fn with_queue_name(mut self, queue_name: &str) -> Self {
        self.queue_name = queue_name.to_string();
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_error_delay(mut self, delay: Duration) -> Self {
        self.error_delay = delay;
        self
    }

    /// Main loop. Runs until the shutdown flag flips; an in-flight ticket
    /// is dropped on shutdown, not requeued.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Kitchen worker started; waiting for orders on '{}'",
            self.queue_name
        );
        while !*shutdown.borrow() {
            match self.queue.pop(&self.queue_name, self.poll_timeout).await {
                // Waiting -> Processing
                Ok(Some(payload)) => self.handle_payload(&payload, &mut shutdown).await,
                // Timeout is not an error; keep waiting
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Queue unreachable: {}; retrying in {:?}",
                        e, self.reconnect_backoff
                    );
                    sleep_unless_shutdown(self.reconnect_backoff, &mut shutdown).await;
                }
            }
        }
        info!("Kitchen worker stopped");
    }

    async fn handle_payload(&self, payload: &[u8], shutdown: &mut watch::Receiver<bool>) {
        let ticket: Ticket = match serde_json::from_slice(payload) {
            Ok(ticket) => ticket,
            Err(e) => {
                // Fail soft: a malformed ticket must not take the worker down
                error!("Discarding malformed ticket payload: {}", e);
                return;
            }
        };

        info!(
            "Received order #{} (id {}), {} item(s)",
            ticket.order_number,
            ticket.order_id,
            ticket.items.len()
        );

        if let Err(e) = self.handler.process(&ticket).await {
            error!("Failed to process order #{}: {}", ticket.order_number, e);
            sleep_unless_shutdown(self.error_delay, shutdown).await;
        }
        // Processing -> Waiting
    }
}

async fn sleep_unless_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = shutdown.changed() => {}
    }
}
