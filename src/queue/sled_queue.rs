use super::{QueueError, WorkQueue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Durable FIFO queue over sled.
///
/// Each queue name maps to its own tree (`queue:<name>`). Entry keys come
/// from the database's monotonic ID generator encoded big-endian, so sled's
/// lexicographic key order is insertion order and `pop_min` always removes
/// the oldest entry. `pop_min` is atomic, which is what makes delivery to
/// exactly one of several competing consumers work without coordination.
pub struct SledWorkQueue {
    db: sled::Db,
    trees: Mutex<HashMap<String, sled::Tree>>,
    notifiers: Mutex<HashMap<String, Arc<Notify>>>,
}

impl SledWorkQueue {
    /// Create a queue client over an already-open database.
    ///
    /// The combined server process shares one sled database between the
    /// order store and the queue; a standalone worker opens its own.
    pub fn new(db: sled::Db) -> Self {
        Self {
            db,
            trees: Mutex::new(HashMap::new()),
            notifiers: Mutex::new(HashMap::new()),
        }
    }

    /// Open (or create) a queue database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QueueError> {
        let db = sled::open(path)?;
        Ok(Self::new(db))
    }

    fn tree(&self, key: &str) -> Result<sled::Tree, QueueError> {
        let mut trees = self
            .trees
            .lock()
            .map_err(|_| QueueError::Storage("queue tree cache lock poisoned".to_string()))?;
        if let Some(tree) = trees.get(key) {
            return Ok(tree.clone());
        }
        let tree = self.db.open_tree(format!("queue:{}", key))?;
        trees.insert(key.to_string(), tree.clone());
        Ok(tree)
    }

    fn notifier(&self, key: &str) -> Arc<Notify> {
        let mut notifiers = match self.notifiers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        notifiers
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    fn try_pop(&self, key: &str) -> Result<Option<Vec<u8>>, QueueError> {
        let tree = self.tree(key)?;
        match tree.pop_min()? {
            Some((_seq, payload)) => {
                tree.flush()?;
                Ok(Some(payload.to_vec()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl WorkQueue for SledWorkQueue {
    async fn push(&self, key: &str, payload: &[u8]) -> Result<u64, QueueError> {
        let tree = self.tree(key)?;
        let seq = self.db.generate_id()?;
        tree.insert(seq.to_be_bytes(), payload)?;
        // Entries must survive a crash once push has returned
        tree.flush()?;
        // Depth snapshot only; a concurrent pop may already have taken
        // this entry
        let len = tree.len() as u64;
        self.notifier(key).notify_waiters();
        Ok(len)
    }

    async fn pop(&self, key: &str, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            let notify = self.notifier(key);
            let notified = notify.notified();
            tokio::pin!(notified);
            // Register interest before the emptiness check so a push that
            // lands in between still wakes this consumer
            notified.as_mut().enable();

            if let Some(payload) = self.try_pop(key)? {
                return Ok(Some(payload));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                // One last check: a push may have raced the timeout
                return self.try_pop(key);
            }
        }
    }
}
