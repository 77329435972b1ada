use crate::error::{OrderFlowError, OrderFlowResult};
use std::path::Path;

/// Unified access to the order store's persistent state.
///
/// Wraps the sled database and caches the trees the pipeline uses:
///
/// * `orders` - one row per order, keyed by big-endian order id
/// * `order_items` - item rows keyed by order id + item id, so all items of
///   an order form one contiguous key range
/// * `order_numbers` - index from human-facing order number to order id;
///   entries are never removed, which is what keeps numbers from being
///   reused after an order is deleted
/// * `outbox` - queue tickets awaiting relay, keyed by insertion sequence
#[derive(Clone)]
pub struct DbOperations {
    db: sled::Db,
    pub(crate) orders_tree: sled::Tree,
    pub(crate) order_items_tree: sled::Tree,
    pub(crate) order_numbers_tree: sled::Tree,
    pub(crate) outbox_tree: sled::Tree,
}

impl DbOperations {
    /// Creates a new DbOperations instance with all required trees.
    pub fn new(db: sled::Db) -> Result<Self, sled::Error> {
        let orders_tree = db.open_tree("orders")?;
        let order_items_tree = db.open_tree("order_items")?;
        let order_numbers_tree = db.open_tree("order_numbers")?;
        let outbox_tree = db.open_tree("outbox")?;

        Ok(Self {
            db,
            orders_tree,
            order_items_tree,
            order_numbers_tree,
            outbox_tree,
        })
    }

    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> OrderFlowResult<Self> {
        let db = sled::open(path)?;
        Self::new(db).map_err(OrderFlowError::from)
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Next value from the database-wide monotonic ID generator.
    pub(crate) fn next_id(&self) -> OrderFlowResult<u64> {
        self.db.generate_id().map_err(OrderFlowError::from)
    }

    /// Flush the database so completed writes survive a crash.
    pub(crate) fn flush(&self) -> OrderFlowResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
