use crate::constants::{
    DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_PROCESSING_ERROR_DELAY_SECS,
    DEFAULT_RECONNECT_BACKOFF_SECS, KITCHEN_QUEUE,
};
use crate::error::OrderFlowError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for an orderflow node instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path where the node will store its data
    pub storage_path: PathBuf,
    /// HTTP bind address for the API process
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Queue name the intake service publishes kitchen tickets to
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    /// Tenant incoming orders are scoped to until tenant resolution moves
    /// into the request context
    #[serde(default = "default_tenant_id")]
    pub tenant_id: u64,
    /// Kitchen worker tuning
    #[serde(default)]
    pub worker: WorkerConfig,
}

fn default_bind_address() -> String {
    format!("127.0.0.1:{}", crate::constants::DEFAULT_HTTP_PORT)
}

fn default_queue_name() -> String {
    KITCHEN_QUEUE.to_string()
}

fn default_tenant_id() -> u64 {
    1
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("data"),
            bind_address: default_bind_address(),
            queue_name: default_queue_name(),
            tenant_id: default_tenant_id(),
            worker: WorkerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a new node configuration with the specified storage path
    pub fn new(storage_path: PathBuf) -> Self {
        Self {
            storage_path,
            ..Default::default()
        }
    }

    pub fn with_bind_address(mut self, address: &str) -> Self {
        self.bind_address = address.to_string();
        self
    }

    pub fn with_queue_name(mut self, queue_name: &str) -> Self {
        self.queue_name = queue_name.to_string();
        self
    }

    pub fn with_worker(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }

    /// Check that a server built from this config will have someone draining
    /// its queue. The embedded queue lives inside the server process and
    /// holds an exclusive lock on the storage directory, so a separate
    /// consumer process cannot attach while the server runs; a server with
    /// zero in-process workers would strand every ticket.
    pub fn ensure_ticket_consumers(&self) -> Result<(), OrderFlowError> {
        if self.worker.count == 0 {
            return Err(OrderFlowError::Config(
                "worker.count is 0: the embedded queue is only reachable from this \
                 process, so no ticket would ever be consumed; configure at least \
                 one worker"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Timing and sizing for kitchen workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// How many in-process workers the server spawns (0 = none; run the
    /// standalone worker binary instead)
    #[serde(default = "default_worker_count")]
    pub count: usize,
    /// Blocking pop timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Fixed backoff after a queue connectivity failure, in seconds
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,
    /// Pause after a per-ticket processing failure, in seconds
    #[serde(default = "default_error_delay")]
    pub error_delay_secs: u64,
    /// Duration of the simulated fulfillment work, in milliseconds
    #[serde(default = "default_prep_millis")]
    pub simulated_prep_millis: u64,
}

fn default_worker_count() -> usize {
    1
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

fn default_reconnect_backoff() -> u64 {
    DEFAULT_RECONNECT_BACKOFF_SECS
}

fn default_error_delay() -> u64 {
    DEFAULT_PROCESSING_ERROR_DELAY_SECS
}

fn default_prep_millis() -> u64 {
    2000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            poll_timeout_secs: default_poll_timeout(),
            reconnect_backoff_secs: default_reconnect_backoff(),
            error_delay_secs: default_error_delay(),
            simulated_prep_millis: default_prep_millis(),
        }
    }
}

/// Load the node configuration from a JSON file.
///
/// Resolution order: explicit path argument, then the `ORDERFLOW_CONFIG`
/// environment variable, then `config/node_config.json`. A missing file
/// falls back to defaults; a file that exists but does not parse is an
/// error.
pub fn load_node_config(path: Option<&str>) -> Result<NodeConfig, std::io::Error> {
    use std::fs;

    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var("ORDERFLOW_CONFIG").ok())
        .unwrap_or_else(|| "config/node_config.json".to_string());

    if let Ok(config_str) = fs::read_to_string(&config_path) {
        match serde_json::from_str::<NodeConfig>(&config_str) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                log::error!("Failed to parse node configuration: {}", e);
                Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }
        }
    } else {
        log::info!(
            "No config file at {}; using default configuration",
            config_path
        );
        Ok(NodeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = NodeConfig::default();
        assert_eq!(config.queue_name, KITCHEN_QUEUE);
        assert_eq!(config.worker.poll_timeout_secs, 5);
        assert_eq!(config.worker.reconnect_backoff_secs, 5);
        assert_eq!(config.worker.error_delay_secs, 1);
    }

    #[test]
    fn zero_workers_cannot_serve_tickets() {
        let mut config = NodeConfig::default();
        config.worker.count = 0;
        assert!(config.ensure_ticket_consumers().is_err());
        assert!(NodeConfig::default().ensure_ticket_consumers().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg: NodeConfig =
            serde_json::from_str(r#"{"storage_path": "/tmp/orders"}"#).unwrap();
        assert_eq!(cfg.storage_path, PathBuf::from("/tmp/orders"));
        assert_eq!(cfg.queue_name, KITCHEN_QUEUE);
        assert_eq!(cfg.worker.count, 1);
    }
}
