use orderflow::orders::{DraftItem, Money, OrderDraft, OrderStatus, PaymentStatus};
use orderflow::{DbOperations, OrderFlowError};
use tempfile::tempdir;

fn store(dir: &tempfile::TempDir) -> DbOperations {
    DbOperations::open(dir.path()).unwrap()
}

fn draft() -> OrderDraft {
    OrderDraft {
        order_type: "DINE_IN".to_string(),
        payment_method: "CASH".to_string(),
        total_amount: Money::from_cents(900),
        items: vec![DraftItem {
            menu_item_id: 5,
            quantity: 3,
            unit_price: Money::from_cents(300),
            special_instructions: None,
        }],
    }
}

#[test]
fn status_moves_through_the_lifecycle() {
    let dir = tempdir().unwrap();
    let db = store(&dir);
    let (order, _, _) = db.create_order_with_items(&draft(), 1, "AAAA01").unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);

    let order = db.update_order_status(order.id, OrderStatus::Preparing).unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);
    let order = db.update_order_status(order.id, OrderStatus::Ready).unwrap();
    let order = db.update_order_status(order.id, OrderStatus::Completed).unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.completed_at.is_some());

    // The update was persisted, not just returned
    let stored = db.get_order(order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Completed);
}

#[test]
fn backward_and_post_terminal_transitions_are_rejected() {
    let dir = tempdir().unwrap();
    let db = store(&dir);
    let (order, _, _) = db.create_order_with_items(&draft(), 1, "AAAA02").unwrap();

    db.update_order_status(order.id, OrderStatus::Ready).unwrap();
    assert!(matches!(
        db.update_order_status(order.id, OrderStatus::Preparing),
        Err(OrderFlowError::Validation(_))
    ));

    db.update_order_status(order.id, OrderStatus::Completed).unwrap();
    assert!(matches!(
        db.update_order_status(order.id, OrderStatus::Cancelled),
        Err(OrderFlowError::Validation(_))
    ));
    // Terminal state is unchanged after the rejected attempts
    let stored = db.get_order(order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Completed);
}

#[test]
fn any_active_order_can_be_cancelled() {
    let dir = tempdir().unwrap();
    let db = store(&dir);
    let (order, _, _) = db.create_order_with_items(&draft(), 1, "AAAA03").unwrap();

    db.update_order_status(order.id, OrderStatus::Preparing).unwrap();
    let order = db.update_order_status(order.id, OrderStatus::Cancelled).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.completed_at.is_none());
}

#[test]
fn racing_terminal_updates_have_exactly_one_winner() {
    let dir = tempdir().unwrap();
    let db = store(&dir);
    let (order, _, _) = db.create_order_with_items(&draft(), 1, "AAAA05").unwrap();
    let order_id = order.id;
    db.update_order_status(order_id, OrderStatus::Ready).unwrap();

    // Concurrent completes and cancels all validate against the stored
    // status; whichever lands first wins and the rest must be rejected.
    let mut handles = Vec::new();
    for n in 0..8 {
        let db = db.clone();
        let target = if n % 2 == 0 {
            OrderStatus::Completed
        } else {
            OrderStatus::Cancelled
        };
        handles.push(std::thread::spawn(move || {
            db.update_order_status(order_id, target).is_ok()
        }));
    }
    let wins = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1);

    let stored = db.get_order(order_id).unwrap().unwrap();
    assert!(stored.status.is_terminal());
}

#[test]
fn updating_a_missing_order_is_not_found() {
    let dir = tempdir().unwrap();
    let db = store(&dir);
    assert!(matches!(
        db.update_order_status(999, OrderStatus::Preparing),
        Err(OrderFlowError::NotFound(_))
    ));
}

#[test]
fn orders_survive_reopen() {
    let dir = tempdir().unwrap();
    let order_id;
    {
        let db = store(&dir);
        let (order, items, _) = db.create_order_with_items(&draft(), 1, "AAAA04").unwrap();
        order_id = order.id;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal, Money::from_cents(900));
    }

    let db = store(&dir);
    let order = db.get_order(order_id).unwrap().unwrap();
    assert_eq!(order.order_number, "AAAA04");
    assert_eq!(db.get_order_items(order_id).unwrap().len(), 1);
    assert!(db.order_number_exists("AAAA04").unwrap());
}
