//! Database operation handlers for the order store.
//!
//! All persistent state lives in one sled database with a tree per concern.
//! `DbOperations` is the single entry point; it is cheap to clone and safe
//! to share across request handlers and background tasks.

pub mod core;
pub mod order_operations;
pub mod outbox_operations;

pub use self::core::DbOperations;
pub use outbox_operations::OutboxEntry;
