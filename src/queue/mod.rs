//! Work queue abstraction and its sled-backed implementation.
//!
//! The queue is a durable, strictly-FIFO list keyed by a queue name. `pop`
//! is destructive: once an entry is returned the queue has no further record
//! of it. There is no acknowledgment or redelivery; competing consumers each
//! receive a given entry at most once.
//!
//! The client is constructed explicitly and passed in as `Arc<dyn WorkQueue>`
//! wherever it is needed; there is no process-wide handle.

pub mod error;
pub mod sled_queue;

pub use error::QueueError;
pub use sled_queue::SledWorkQueue;

use async_trait::async_trait;
use std::time::Duration;

/// A named FIFO channel of opaque payloads.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append one entry to the named queue and return its length.
    ///
    /// Each call adds exactly one entry; duplicate payloads create duplicate
    /// entries. The entry is durable before this returns. The returned
    /// length is a snapshot taken after the insert; with consumers popping
    /// concurrently it may not count this entry. Callers use it for logging
    /// queue depth, nothing more.
    async fn push(&self, key: &str, payload: &[u8]) -> Result<u64, QueueError>;

    /// Remove and return the oldest entry of the named queue.
    ///
    /// Blocks up to `timeout` while the queue is empty. Returns `Ok(None)`
    /// on timeout; an `Err` means the underlying transport failed, never
    /// "no data".
    async fn pop(&self, key: &str, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError>;
}
