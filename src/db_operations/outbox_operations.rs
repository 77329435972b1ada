use super::core::DbOperations;
use crate::error::{OrderFlowError, OrderFlowResult};
use crate::orders::Ticket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ticket persisted in the same transaction as its order, awaiting relay
/// to the work queue.
///
/// Rows are keyed by `seq` (big-endian), so scanning the tree visits them
/// in the order the orders committed. `relayed` flips to true only after a
/// confirmed publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub seq: u64,
    pub order_id: u64,
    pub ticket: Ticket,
    pub relayed: bool,
    pub created_at: DateTime<Utc>,
}

impl DbOperations {
    /// Un-relayed outbox rows in commit order, up to `limit`.
    pub fn unrelayed_outbox_entries(&self, limit: usize) -> OrderFlowResult<Vec<OutboxEntry>> {
        let mut entries = Vec::new();
        for row in self.outbox_tree.iter() {
            let (_key, bytes) = row?;
            let entry: OutboxEntry = serde_json::from_slice(&bytes)?;
            if !entry.relayed {
                entries.push(entry);
                if entries.len() >= limit {
                    break;
                }
            }
        }
        Ok(entries)
    }

    /// Record that an outbox row's ticket reached the queue.
    pub fn mark_outbox_relayed(&self, seq: u64) -> OrderFlowResult<()> {
        let key = seq.to_be_bytes();
        let mut entry: OutboxEntry = match self.outbox_tree.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => {
                return Err(OrderFlowError::NotFound(format!("outbox entry {}", seq)));
            }
        };
        entry.relayed = true;
        self.outbox_tree.insert(key, serde_json::to_vec(&entry)?)?;
        self.flush()?;
        Ok(())
    }

    /// Drop relayed rows older than the given cutoff. Keeps the outbox tree
    /// from growing without bound; called opportunistically by the relay.
    pub fn prune_relayed_outbox(&self, before: DateTime<Utc>) -> OrderFlowResult<usize> {
        let mut pruned = 0;
        let rows: Vec<(sled::IVec, sled::IVec)> =
            self.outbox_tree.iter().collect::<Result<_, _>>()?;
        for (key, bytes) in rows {
            let entry: OutboxEntry = serde_json::from_slice(&bytes)?;
            if entry.relayed && entry.created_at < before {
                self.outbox_tree.remove(key)?;
                pruned += 1;
            }
        }
        if pruned > 0 {
            self.flush()?;
        }
        Ok(pruned)
    }
}
