use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status of an order.
///
/// Status only moves forward through the variants in declaration order, with
/// `Cancelled` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transitions are allowed out of this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` respects the order lifecycle.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Cancelled {
            return true;
        }
        (next as u8) > (self as u8)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    /// Derive the initial payment status from the payment method named in a
    /// draft: cash is settled at the counter, everything else is captured
    /// before the order is placed.
    pub fn from_payment_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("cash") {
            Self::Unpaid
        } else {
            Self::Paid
        }
    }
}

/// Fixed-point currency amount with two decimal places, stored as cents.
///
/// Serializes as a plain JSON number (`10.00`) so tickets and API payloads
/// keep the wire shape the kiosk clients expect, while all arithmetic stays
/// exact integer math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Build from a fractional amount, rounding to the nearest cent.
    pub fn from_major(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a quantity, returning None on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Ok(Money::from_major(amount))
    }
}

/// An order as recorded in the order store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub tenant_id: u64,
    /// Human-facing 6-character uppercase token, unique and never reused
    pub order_number: String,
    pub order_type: String,
    pub payment_method: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A line item owned by exactly one order. Immutable once the order exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub menu_item_id: u64,
    pub quantity: u32,
    pub unit_price: Money,
    /// Always quantity * unit_price; computed by the store, never taken
    /// from input
    pub subtotal: Money,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// A line item as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftItem {
    pub menu_item_id: u64,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// A new order as submitted by a client, before validation or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_type: String,
    pub payment_method: String,
    pub total_amount: Money,
    pub items: Vec<DraftItem>,
}

/// One ticket item on the wire; intentionally narrower than [`OrderItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketItem {
    pub menu_item_id: u64,
    pub quantity: u32,
    pub unit_price: Money,
}

/// The message placed on the work queue for kitchen processing.
///
/// A point-in-time snapshot of the committed order. Workers consume the
/// ticket as-is and never re-read the order store to reconstruct it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub order_id: u64,
    pub order_number: String,
    pub tenant_id: u64,
    pub items: Vec<TicketItem>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Snapshot a committed order and its items.
    pub fn from_order(order: &Order, items: &[OrderItem]) -> Self {
        Ticket {
            order_id: order.id,
            order_number: order.order_number.clone(),
            tenant_id: order.tenant_id,
            items: items
                .iter()
                .map(|item| TicketItem {
                    menu_item_id: item.menu_item_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            created_at: order.created_at,
        }
    }
}
