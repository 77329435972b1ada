//! Service node: wires the order store, queue client, intake service,
//! outbox relay, and kitchen workers together, and exposes the inbound
//! HTTP boundary.

pub mod config;
pub mod http_server;
pub mod node;
pub mod order_routes;

pub use config::{load_node_config, NodeConfig, WorkerConfig};
pub use http_server::OrderHttpServer;
pub use node::OrderNode;
