//! Order domain types shared by the intake service, the order store, and the
//! kitchen worker.

pub mod types;

pub use types::{
    DraftItem, Money, Order, OrderDraft, OrderItem, OrderStatus, PaymentStatus, Ticket, TicketItem,
};
