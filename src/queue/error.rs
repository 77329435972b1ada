use thiserror::Error;

/// Error types for work queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue transport could not be reached at all
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    /// The transport was reachable but an operation on it failed
    #[error("Queue storage error: {0}")]
    Storage(String),
}

impl From<sled::Error> for QueueError {
    fn from(error: sled::Error) -> Self {
        match error {
            sled::Error::Io(e) => QueueError::Unavailable(e.to_string()),
            other => QueueError::Storage(other.to_string()),
        }
    }
}
