use super::config::NodeConfig;
use crate::db_operations::DbOperations;
use crate::error::OrderFlowResult;
use crate::intake::{OrderIntakeService, SubmitReceipt};
use crate::orders::{Order, OrderDraft, OrderItem};
use crate::outbox::OutboxRelay;
use crate::queue::{SledWorkQueue, WorkQueue};
use crate::worker::{KitchenWorker, SimulatedFulfillment};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// An orderflow node: the order store, the queue client, and the intake
/// service behind one handle.
///
/// The queue client is constructed here and passed to every component that
/// needs it; nothing reaches for a process-wide handle.
pub struct OrderNode {
    pub config: NodeConfig,
    db: DbOperations,
    queue: Arc<dyn WorkQueue>,
    intake: OrderIntakeService,
}

impl OrderNode {
    /// Open the node's storage and wire up the default sled-backed queue,
    /// which shares the store's database.
    pub fn load(config: NodeConfig) -> OrderFlowResult<Self> {
        let db = DbOperations::open(&config.storage_path)?;
        let queue: Arc<dyn WorkQueue> = Arc::new(SledWorkQueue::new(db.db().clone()));
        Ok(Self::with_queue(config, db, queue))
    }

    /// Wire a node over an explicit store and queue client. Tests use this
    /// to substitute failing or shared queues.
    pub fn with_queue(config: NodeConfig, db: DbOperations, queue: Arc<dyn WorkQueue>) -> Self {
        let intake = OrderIntakeService::new(db.clone(), Arc::clone(&queue))
            .with_queue_name(&config.queue_name)
            .with_default_tenant(config.tenant_id);
        Self {
            config,
            db,
            queue,
            intake,
        }
    }

    /// Submit a new order through the intake service.
    pub async fn submit_order(&self, draft: OrderDraft) -> OrderFlowResult<SubmitReceipt> {
        self.intake.submit(draft).await
    }

    /// Fetch an order and its items.
    pub fn get_order_with_items(
        &self,
        order_id: u64,
    ) -> OrderFlowResult<Option<(Order, Vec<OrderItem>)>> {
        match self.db.get_order(order_id)? {
            Some(order) => {
                let items = self.db.get_order_items(order_id)?;
                Ok(Some((order, items)))
            }
            None => Ok(None),
        }
    }

    pub fn db(&self) -> &DbOperations {
        &self.db
    }

    pub fn queue(&self) -> Arc<dyn WorkQueue> {
        Arc::clone(&self.queue)
    }

    /// Spawn the configured number of in-process kitchen workers.
    pub fn spawn_workers(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let worker_cfg = &self.config.worker;
        let mut handles = Vec::with_capacity(worker_cfg.count);
        for n in 0..worker_cfg.count {
            let fulfillment = Arc::new(SimulatedFulfillment::new(Duration::from_millis(
                worker_cfg.simulated_prep_millis,
            )));
            let worker = KitchenWorker::new(self.queue(), fulfillment)
                .with_queue_name(&self.config.queue_name)
                .with_poll_timeout(Duration::from_secs(worker_cfg.poll_timeout_secs))
                .with_reconnect_backoff(Duration::from_secs(worker_cfg.reconnect_backoff_secs))
                .with_error_delay(Duration::from_secs(worker_cfg.error_delay_secs));
            let shutdown = shutdown.clone();
            info!("Spawning kitchen worker {}", n + 1);
            handles.push(tokio::spawn(worker.run(shutdown)));
        }
        handles
    }

    /// Spawn the outbox relay task.
    pub fn spawn_relay(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let relay = OutboxRelay::new(self.db.clone(), self.queue())
            .with_queue_name(&self.config.queue_name);
        tokio::spawn(relay.run(shutdown))
    }
}
