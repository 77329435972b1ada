use super::core::DbOperations;
use super::outbox_operations::OutboxEntry;
use crate::error::{OrderFlowError, OrderFlowResult};
use crate::orders::{Order, OrderDraft, OrderItem, OrderStatus, PaymentStatus, Ticket};
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};

/// Key of an item row: order id then item id, both big-endian, so every
/// order's items occupy one contiguous key range.
fn item_key(order_id: u64, item_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&order_id.to_be_bytes());
    key[8..].copy_from_slice(&item_id.to_be_bytes());
    key
}

impl DbOperations {
    /// Persist a validated order draft as one atomic write.
    ///
    /// Inserts the order row (status pending, payment status derived from
    /// the payment method), all item rows with computed subtotals, the
    /// order-number index entry, and the outbox row holding the queue
    /// ticket - all in a single multi-tree transaction. Either the whole
    /// order exists afterwards or none of it does.
    ///
    /// The caller supplies an order number it has checked for uniqueness;
    /// the transaction re-checks the index and aborts on a collision.
    pub fn create_order_with_items(
        &self,
        draft: &OrderDraft,
        tenant_id: u64,
        order_number: &str,
    ) -> OrderFlowResult<(Order, Vec<OrderItem>, OutboxEntry)> {
        let created_at = Utc::now();
        let order_id = self.next_id()?;

        let order = Order {
            id: order_id,
            tenant_id,
            order_number: order_number.to_string(),
            order_type: draft.order_type.clone(),
            payment_method: draft.payment_method.clone(),
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::from_payment_method(&draft.payment_method),
            created_at,
            completed_at: None,
        };

        let mut items = Vec::with_capacity(draft.items.len());
        for draft_item in &draft.items {
            let subtotal = draft_item
                .unit_price
                .checked_mul(draft_item.quantity)
                .ok_or_else(|| {
                    OrderFlowError::Validation("item subtotal overflows".to_string())
                })?;
            items.push(OrderItem {
                id: self.next_id()?,
                order_id,
                menu_item_id: draft_item.menu_item_id,
                quantity: draft_item.quantity,
                unit_price: draft_item.unit_price,
                subtotal,
                special_instructions: draft_item.special_instructions.clone(),
            });
        }

        let outbox_entry = OutboxEntry {
            seq: self.next_id()?,
            order_id,
            ticket: Ticket::from_order(&order, &items),
            relayed: false,
            created_at,
        };

        // Serialize outside the transaction; the closure may run more than
        // once on conflict.
        let order_bytes = serde_json::to_vec(&order)?;
        let item_rows: Vec<([u8; 16], Vec<u8>)> = items
            .iter()
            .map(|item| Ok((item_key(order_id, item.id), serde_json::to_vec(item)?)))
            .collect::<OrderFlowResult<_>>()?;
        let outbox_bytes = serde_json::to_vec(&outbox_entry)?;
        let order_key = order_id.to_be_bytes();
        let number_key = order_number.as_bytes();
        let outbox_key = outbox_entry.seq.to_be_bytes();

        let result = (
            &self.orders_tree,
            &self.order_items_tree,
            &self.order_numbers_tree,
            &self.outbox_tree,
        )
            .transaction(|(orders, order_items, order_numbers, outbox)| {
                if order_numbers.get(number_key)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(format!(
                        "order number {} already exists",
                        order_number
                    )));
                }
                order_numbers.insert(number_key, &order_key[..])?;
                orders.insert(&order_key[..], order_bytes.as_slice())?;
                for (key, bytes) in &item_rows {
                    order_items.insert(&key[..], bytes.as_slice())?;
                }
                outbox.insert(&outbox_key[..], outbox_bytes.as_slice())?;
                Ok(())
            });

        match result {
            Ok(()) => {
                self.flush()?;
                Ok((order, items, outbox_entry))
            }
            Err(TransactionError::Abort(msg)) => Err(OrderFlowError::Database(msg)),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    /// Fetch an order by id.
    pub fn get_order(&self, order_id: u64) -> OrderFlowResult<Option<Order>> {
        match self.orders_tree.get(order_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Fetch all items of an order, in insertion order.
    pub fn get_order_items(&self, order_id: u64) -> OrderFlowResult<Vec<OrderItem>> {
        let mut items = Vec::new();
        for entry in self.order_items_tree.scan_prefix(order_id.to_be_bytes()) {
            let (_key, bytes) = entry?;
            items.push(serde_json::from_slice(&bytes)?);
        }
        Ok(items)
    }

    /// Whether an order number has ever been issued by this store.
    pub fn order_number_exists(&self, order_number: &str) -> OrderFlowResult<bool> {
        Ok(self.order_numbers_tree.get(order_number.as_bytes())?.is_some())
    }

    /// Advance an order's lifecycle status.
    ///
    /// Rejects transitions that move backwards or leave a terminal state.
    /// Sets `completed_at` when the order reaches `Completed`. Not called by
    /// the kitchen worker today; this is the contract the admin boundary
    /// and a status-writing fulfillment handler would use.
    pub fn update_order_status(
        &self,
        order_id: u64,
        next: OrderStatus,
    ) -> OrderFlowResult<Order> {
        let key = order_id.to_be_bytes();
        // Read, validate, and write inside one transaction; two racing
        // updates must not both pass validation against a stale status.
        let result = self.orders_tree.transaction(|orders| {
            let bytes = orders.get(&key[..])?.ok_or_else(|| {
                ConflictableTransactionError::Abort(OrderFlowError::NotFound(format!(
                    "order {}",
                    order_id
                )))
            })?;
            let mut order: Order = serde_json::from_slice(&bytes)
                .map_err(|e| ConflictableTransactionError::Abort(e.into()))?;

            if !order.status.can_transition_to(next) {
                return Err(ConflictableTransactionError::Abort(
                    OrderFlowError::Validation(format!(
                        "invalid status transition {} -> {}",
                        order.status, next
                    )),
                ));
            }

            order.status = next;
            if next == OrderStatus::Completed {
                order.completed_at = Some(Utc::now());
            }
            let bytes = serde_json::to_vec(&order)
                .map_err(|e| ConflictableTransactionError::Abort(e.into()))?;
            orders.insert(&key[..], bytes)?;
            Ok(order)
        });

        match result {
            Ok(order) => {
                self.flush()?;
                Ok(order)
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    /// Delete an order and all of its items.
    ///
    /// The order-number index entry stays behind so the number is never
    /// issued again.
    pub fn delete_order(&self, order_id: u64) -> OrderFlowResult<()> {
        let item_keys: Vec<sled::IVec> = self
            .order_items_tree
            .scan_prefix(order_id.to_be_bytes())
            .keys()
            .collect::<Result<_, _>>()?;
        for key in item_keys {
            self.order_items_tree.remove(key)?;
        }
        self.orders_tree.remove(order_id.to_be_bytes())?;
        self.flush()?;
        Ok(())
    }

    /// Number of orders currently in the store.
    pub fn order_count(&self) -> usize {
        self.orders_tree.len()
    }
}
