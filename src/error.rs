use crate::queue::QueueError;
use std::fmt;
use std::io;

/// Unified error type for the order pipeline.
///
/// Each variant represents a category of failure with enough context for
/// logging and for mapping to an HTTP status at the API boundary.
#[derive(Debug)]
pub enum OrderFlowError {
    /// A malformed order draft was rejected before anything was persisted
    Validation(String),

    /// Errors from the underlying order store
    Database(String),

    /// A requested order does not exist
    NotFound(String),

    /// Errors from the work queue transport
    Queue(QueueError),

    /// Errors serializing or deserializing rows, tickets, or config
    Serialization(String),

    /// Errors loading or validating configuration
    Config(String),

    /// Errors related to IO operations
    Io(io::Error),
}

impl fmt::Display for OrderFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Database(msg) => write!(f, "Database error: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Queue(err) => write!(f, "Queue error: {}", err),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for OrderFlowError {}

/// Conversion from QueueError to OrderFlowError
impl From<QueueError> for OrderFlowError {
    fn from(error: QueueError) -> Self {
        OrderFlowError::Queue(error)
    }
}

/// Conversion from io::Error to OrderFlowError
impl From<io::Error> for OrderFlowError {
    fn from(error: io::Error) -> Self {
        OrderFlowError::Io(error)
    }
}

/// Conversion from serde_json::Error to OrderFlowError
impl From<serde_json::Error> for OrderFlowError {
    fn from(error: serde_json::Error) -> Self {
        OrderFlowError::Serialization(error.to_string())
    }
}

/// Conversion from sled::Error to OrderFlowError
impl From<sled::Error> for OrderFlowError {
    fn from(error: sled::Error) -> Self {
        OrderFlowError::Database(error.to_string())
    }
}

/// Result type alias for operations that can result in an OrderFlowError
pub type OrderFlowResult<T> = Result<T, OrderFlowError>;
