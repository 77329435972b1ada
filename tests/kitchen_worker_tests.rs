use async_trait::async_trait;
use chrono::Utc;
use orderflow::orders::{DraftItem, Money, OrderDraft, Ticket, TicketItem};
use orderflow::{
    FulfillmentHandler, KitchenWorker, NodeConfig, OrderFlowError, OrderFlowResult, OrderNode,
    QueueError, SledWorkQueue, WorkQueue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::watch;

/// Records every ticket it processes.
struct RecordingHandler {
    processed: Mutex<Vec<Ticket>>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            processed: Mutex::new(Vec::new()),
        })
    }

    fn tickets(&self) -> Vec<Ticket> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentHandler for RecordingHandler {
    async fn process(&self, ticket: &Ticket) -> OrderFlowResult<()> {
        self.processed.lock().unwrap().push(ticket.clone());
        Ok(())
    }
}

/// Fails on tickets whose order number starts with "BAD".
struct FlakyHandler {
    inner: Arc<RecordingHandler>,
}

#[async_trait]
impl FulfillmentHandler for FlakyHandler {
    async fn process(&self, ticket: &Ticket) -> OrderFlowResult<()> {
        if ticket.order_number.starts_with("BAD") {
            return Err(OrderFlowError::Validation("kitchen rejected ticket".to_string()));
        }
        self.inner.process(ticket).await
    }
}

/// Errors on the first `failures` pops, then delegates to a real queue.
struct FlakyQueue {
    inner: Arc<SledWorkQueue>,
    remaining_failures: AtomicUsize,
}

#[async_trait]
impl WorkQueue for FlakyQueue {
    async fn push(&self, key: &str, payload: &[u8]) -> Result<u64, QueueError> {
        self.inner.push(key, payload).await
    }

    async fn pop(&self, key: &str, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(QueueError::Unavailable("connection refused".to_string()));
        }
        self.inner.pop(key, timeout).await
    }
}

fn sample_ticket(order_number: &str) -> Ticket {
    Ticket {
        order_id: 1,
        order_number: order_number.to_string(),
        tenant_id: 1,
        items: vec![TicketItem {
            menu_item_id: 7,
            quantity: 2,
            unit_price: Money::from_cents(500),
        }],
        created_at: Utc::now(),
    }
}

fn fast_worker(
    queue: Arc<dyn WorkQueue>,
    handler: Arc<dyn FulfillmentHandler>,
    queue_name: &str,
) -> KitchenWorker {
    KitchenWorker::new(queue, handler)
        .with_queue_name(queue_name)
        .with_poll_timeout(Duration::from_millis(100))
        .with_reconnect_backoff(Duration::from_millis(50))
        .with_error_delay(Duration::from_millis(20))
}

/// Poll until `predicate` holds or the deadline passes.
async fn wait_until<F: Fn() -> bool>(predicate: F, deadline: Duration) -> bool {
    let started = tokio::time::Instant::now();
    while started.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}

#[tokio::test]
async fn end_to_end_submit_to_fulfillment() {
    let dir = tempdir().unwrap();
    let node = OrderNode::load(NodeConfig::new(dir.path().to_path_buf())).unwrap();

    let handler = RecordingHandler::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = fast_worker(node.queue(), handler.clone(), &node.config.queue_name);
    let worker_task = tokio::spawn(worker.run(shutdown_rx));

    let draft = OrderDraft {
        order_type: "DINE_IN".to_string(),
        payment_method: "CASH".to_string(),
        total_amount: Money::from_major(10.00),
        items: vec![DraftItem {
            menu_item_id: 7,
            quantity: 2,
            unit_price: Money::from_major(5.00),
            special_instructions: None,
        }],
    };
    let receipt = node.submit_order(draft).await.unwrap();

    assert!(
        wait_until(|| !handler.tickets().is_empty(), Duration::from_secs(2)).await,
        "worker should dequeue the ticket within the poll timeout"
    );
    let tickets = handler.tickets();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].order_id, receipt.order_id);
    assert_eq!(tickets[0].order_number, receipt.order_number);
    assert_eq!(tickets[0].items[0].unit_price, Money::from_cents(500));

    shutdown_tx.send(true).unwrap();
    worker_task.await.unwrap();
}

#[tokio::test]
async fn malformed_ticket_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let queue: Arc<SledWorkQueue> = Arc::new(SledWorkQueue::open(dir.path()).unwrap());

    queue.push("tickets", b"not json at all").await.unwrap();
    let good = serde_json::to_vec(&sample_ticket("GOOD01")).unwrap();
    queue.push("tickets", &good).await.unwrap();

    let handler = RecordingHandler::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = fast_worker(queue, handler.clone(), "tickets");
    let worker_task = tokio::spawn(worker.run(shutdown_rx));

    assert!(
        wait_until(|| !handler.tickets().is_empty(), Duration::from_secs(2)).await,
        "worker should survive the malformed payload and process the next ticket"
    );
    assert_eq!(handler.tickets()[0].order_number, "GOOD01");

    shutdown_tx.send(true).unwrap();
    worker_task.await.unwrap();
}

#[tokio::test]
async fn processing_failure_is_isolated_to_its_ticket() {
    let dir = tempdir().unwrap();
    let queue: Arc<SledWorkQueue> = Arc::new(SledWorkQueue::open(dir.path()).unwrap());

    let bad = serde_json::to_vec(&sample_ticket("BAD001")).unwrap();
    let good = serde_json::to_vec(&sample_ticket("GOOD02")).unwrap();
    queue.push("tickets", &bad).await.unwrap();
    queue.push("tickets", &good).await.unwrap();

    let recording = RecordingHandler::new();
    let handler = Arc::new(FlakyHandler {
        inner: recording.clone(),
    });
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = fast_worker(queue, handler, "tickets");
    let worker_task = tokio::spawn(worker.run(shutdown_rx));

    assert!(
        wait_until(|| !recording.tickets().is_empty(), Duration::from_secs(2)).await,
        "worker should keep going after a failed ticket"
    );
    assert_eq!(recording.tickets()[0].order_number, "GOOD02");

    shutdown_tx.send(true).unwrap();
    worker_task.await.unwrap();
}

#[tokio::test]
async fn connectivity_loss_backs_off_and_recovers() {
    let dir = tempdir().unwrap();
    let inner: Arc<SledWorkQueue> = Arc::new(SledWorkQueue::open(dir.path()).unwrap());
    let payload = serde_json::to_vec(&sample_ticket("RETRY1")).unwrap();
    inner.push("tickets", &payload).await.unwrap();

    let queue = Arc::new(FlakyQueue {
        inner,
        remaining_failures: AtomicUsize::new(2),
    });

    let handler = RecordingHandler::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = fast_worker(queue, handler.clone(), "tickets");
    let worker_task = tokio::spawn(worker.run(shutdown_rx));

    assert!(
        wait_until(|| !handler.tickets().is_empty(), Duration::from_secs(2)).await,
        "worker should retry after connectivity errors and receive the ticket"
    );
    assert_eq!(handler.tickets()[0].order_number, "RETRY1");

    shutdown_tx.send(true).unwrap();
    worker_task.await.unwrap();
}

#[tokio::test]
async fn two_workers_one_ticket_single_delivery() {
    let dir = tempdir().unwrap();
    let queue: Arc<SledWorkQueue> = Arc::new(SledWorkQueue::open(dir.path()).unwrap());

    let first = RecordingHandler::new();
    let second = RecordingHandler::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task_a = tokio::spawn(
        fast_worker(queue.clone(), first.clone(), "tickets").run(shutdown_rx.clone()),
    );
    let task_b = tokio::spawn(
        fast_worker(queue.clone(), second.clone(), "tickets").run(shutdown_rx),
    );

    let payload = serde_json::to_vec(&sample_ticket("SOLO01")).unwrap();
    queue.push("tickets", &payload).await.unwrap();

    assert!(
        wait_until(
            || first.tickets().len() + second.tickets().len() == 1,
            Duration::from_secs(2)
        )
        .await,
        "exactly one worker should receive the ticket"
    );
    // Give the losing worker a chance to (incorrectly) double-process
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(first.tickets().len() + second.tickets().len(), 1);

    shutdown_tx.send(true).unwrap();
    task_a.await.unwrap();
    task_b.await.unwrap();
}
