//! # Orderflow
//!
//! Core of a restaurant ordering backend: the order submission -> kitchen
//! fulfillment pipeline. A placed order is durably recorded and handed off
//! to kitchen workers that process tickets independently of the
//! request/response cycle.
//!
//! ## Core Components
//!
//! * `orders` - order, item, and ticket domain types
//! * `db_operations` - sled-backed order store (the system of record)
//! * `queue` - durable, blocking FIFO work queue keyed by queue name
//! * `intake` - validates and persists orders, publishes kitchen tickets
//! * `outbox` - relay closing the store-commit / queue-publish gap
//! * `worker` - long-running kitchen ticket consumer
//! * `order_node` - node wiring, configuration, and the HTTP boundary
//!
//! ## Architecture
//!
//! The intake service commits the order, its items, and the queue ticket
//! (as an outbox row) in one atomic transaction, then publishes the ticket
//! best-effort; the outbox relay retries anything the immediate publish
//! missed. Workers block on the queue and compete for tickets; the queue's
//! atomic pop delivers each ticket to exactly one of them.

pub mod constants;
pub mod db_operations;
pub mod error;
pub mod intake;
pub mod logging;
pub mod order_node;
pub mod orders;
pub mod outbox;
pub mod queue;
pub mod worker;

// Re-export main types for convenience
pub use db_operations::DbOperations;
pub use error::{OrderFlowError, OrderFlowResult};
pub use intake::{OrderIntakeService, SubmitReceipt};
pub use order_node::{load_node_config, NodeConfig, OrderHttpServer, OrderNode, WorkerConfig};
pub use orders::{Order, OrderDraft, OrderItem, OrderStatus, PaymentStatus, Ticket};
pub use outbox::OutboxRelay;
pub use queue::{QueueError, SledWorkQueue, WorkQueue};
pub use worker::{FulfillmentHandler, KitchenWorker, SimulatedFulfillment};
