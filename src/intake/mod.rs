//! Order intake: validate a draft, persist it atomically, hand the ticket
//! off to the kitchen queue.

use crate::constants::{KITCHEN_QUEUE, ORDER_NUMBER_LEN};
use crate::db_operations::{DbOperations, OutboxEntry};
use crate::error::{OrderFlowError, OrderFlowResult};
use crate::orders::OrderDraft;
use crate::queue::WorkQueue;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// How many order-number candidates to try before giving up. Collisions on
/// a 6-hex-char token are rare enough that hitting this limit means the
/// store is effectively full of orders.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 16;

/// What the caller gets back from a successful submit.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub order_id: u64,
    pub order_number: String,
}

/// Validates and persists new orders, then publishes their tickets.
pub struct OrderIntakeService {
    db: DbOperations,
    queue: Arc<dyn WorkQueue>,
    queue_name: String,
    default_tenant_id: u64,
}

impl OrderIntakeService {
    pub fn new(db: DbOperations, queue: Arc<dyn WorkQueue>) -> Self {
        Self {
            db,
            queue,
            queue_name: KITCHEN_QUEUE.to_string(),
            default_tenant_id: 1,
        }
    }

    /// Override the queue name (tests use per-case names).
    pub fn with_queue_name(mut self, queue_name: &str) -> Self {
        self.queue_name = queue_name.to_string();
        self
    }

    /// Tenant all incoming orders are scoped to until tenant resolution
    /// moves into the request context.
    pub fn with_default_tenant(mut self, tenant_id: u64) -> Self {
        self.default_tenant_id = tenant_id;
        self
    }

    /// Submit a new order.
    ///
    /// The order and its items are committed atomically (together with the
    /// outbox row) before any publish is attempted, so the order is durable
    /// regardless of queue availability. A publish failure is logged and
    /// swallowed; the outbox relay retries it later.
    pub async fn submit(&self, draft: OrderDraft) -> OrderFlowResult<SubmitReceipt> {
        validate_draft(&draft)?;

        let order_number = self.generate_order_number()?;
        let (order, _items, outbox_entry) =
            self.db
                .create_order_with_items(&draft, self.default_tenant_id, &order_number)?;

        info!(
            "Order #{} (id {}) committed with {} items, total {}",
            order.order_number,
            order.id,
            draft.items.len(),
            order.total_amount
        );

        self.try_publish(&outbox_entry).await;

        Ok(SubmitReceipt {
            order_id: order.id,
            order_number,
        })
    }

    /// Best-effort immediate publish of a freshly committed ticket.
    async fn try_publish(&self, entry: &OutboxEntry) {
        let payload = match serde_json::to_vec(&entry.ticket) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize ticket for order {}: {}", entry.order_id, e);
                return;
            }
        };
        match self.queue.push(&self.queue_name, &payload).await {
            Ok(len) => {
                info!(
                    "Ticket for order #{} queued on '{}' (depth {})",
                    entry.ticket.order_number, self.queue_name, len
                );
                if let Err(e) = self.db.mark_outbox_relayed(entry.seq) {
                    // The relay may push this ticket again; duplicates are
                    // preferable to losing it
                    warn!("Failed to mark outbox entry {} relayed: {}", entry.seq, e);
                }
            }
            Err(e) => {
                warn!(
                    "Failed to queue ticket for order #{}: {}; outbox relay will retry",
                    entry.ticket.order_number, e
                );
            }
        }
    }

    /// A fresh 6-character uppercase token, re-rolled on index collision.
    fn generate_order_number(&self) -> OrderFlowResult<String> {
        for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
            let candidate = new_order_number();
            if !self.db.order_number_exists(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(OrderFlowError::Database(
            "unable to generate a unique order number".to_string(),
        ))
    }
}

fn new_order_number() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..ORDER_NUMBER_LEN].to_uppercase()
}

fn validate_draft(draft: &OrderDraft) -> OrderFlowResult<()> {
    if draft.items.is_empty() {
        return Err(OrderFlowError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    if draft.total_amount.is_negative() {
        return Err(OrderFlowError::Validation(
            "total_amount must not be negative".to_string(),
        ));
    }
    for (idx, item) in draft.items.iter().enumerate() {
        if item.menu_item_id == 0 {
            return Err(OrderFlowError::Validation(format!(
                "item {}: menu_item_id must reference a menu item",
                idx
            )));
        }
        if item.quantity == 0 {
            return Err(OrderFlowError::Validation(format!(
                "item {}: quantity must be positive",
                idx
            )));
        }
        if item.unit_price.is_negative() {
            return Err(OrderFlowError::Validation(format!(
                "item {}: unit_price must not be negative",
                idx
            )));
        }
    }
    Ok(())
}
