/// Common constants used across the orderflow project.
///
/// These defaults are used for command line arguments and
/// configuration when explicit values are not provided.
pub const DEFAULT_HTTP_PORT: u16 = 9001;

/// Well-known queue name the intake service publishes kitchen tickets to.
pub const KITCHEN_QUEUE: &str = "kitchen_orders";

/// How long a worker blocks in pop before looping.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 5;

/// Fixed backoff after a queue connectivity failure.
pub const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;

/// Pause after a per-ticket processing failure.
pub const DEFAULT_PROCESSING_ERROR_DELAY_SECS: u64 = 1;

/// Length of the human-facing order number token.
pub const ORDER_NUMBER_LEN: usize = 6;
