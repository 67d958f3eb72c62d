//! Order model and status lifecycle
//!
//! The order is the only entity with a meaningful lifecycle:
//! `pending → confirmed → preparing → out-for-delivery → delivered`, with a
//! terminal `cancelled` branch reachable from `pending` or `confirmed`.
//! Identifier normalization happens once here, at the system boundary, via
//! [`OrderId::parse`] and [`Order::key`] — never ad hoc at call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The fixed ordered progress timeline. `Cancelled` is deliberately
    /// excluded; it renders as its own branch, never as a step.
    pub const TIMELINE: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Position of this status within [`Self::TIMELINE`], `None` for `Cancelled`.
    pub fn timeline_step(&self) -> Option<usize> {
        Self::TIMELINE.iter().position(|s| s == self)
    }

    /// Customer-initiated cancellation is allowed only before preparation starts.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Terminal states have no defined outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// An order still moving through the kitchen/delivery pipeline.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer-facing projection of a status onto the progress timeline.
///
/// `Cancelled` is intercepted before the index lookup; any status missing
/// from the timeline projects defensively to step 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineView {
    /// Index into [`OrderStatus::TIMELINE`]
    Step(usize),
    /// Distinct rendering branch, never a step index
    Cancelled,
}

impl TimelineView {
    pub fn of(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Cancelled => TimelineView::Cancelled,
            other => TimelineView::Step(other.timeline_step().unwrap_or(0)),
        }
    }
}

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    #[default]
    Delivery,
    DineIn,
}

/// Payment method selected at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    Online,
}

/// Payment state, tracked independently of the order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Who cancelled the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    User,
    Admin,
}

/// A single ordered line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Menu item reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub quantity: i32,
    /// Selected portion label (e.g. "Half Plate")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_portion: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Order entity
///
/// A remote record carries a backend-assigned 24-hex `id`; a guest/offline
/// order may exist with only its generated `order_number`. The wire format
/// is camelCase and tolerates the backend's `_id`/`createdAt` spellings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Remote identifier (24-hex), absent until the backend has the record
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable order number generated at checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub restaurant_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Grand total in currency unit
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<CancelledBy>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Preferred lookup key: remote id once one exists, else the order number.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.order_number.as_deref())
    }

    /// Whether the given identifier addresses this order (remote id or
    /// order number).
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id) || self.order_number.as_deref() == Some(id)
    }

    /// Progress-timeline projection of the current status.
    pub fn timeline_view(&self) -> TimelineView {
        TimelineView::of(self.status)
    }
}

/// Normalized order identifier
///
/// Classified once at the system boundary: exactly 24 hexadecimal characters
/// is a backend-assigned remote id, anything else is a local identifier
/// (order number or cache id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderId {
    Remote(String),
    Local(String),
}

impl OrderId {
    pub fn parse(raw: &str) -> Self {
        if raw.len() == 24 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            OrderId::Remote(raw.to_string())
        } else {
            OrderId::Local(raw.to_string())
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, OrderId::Remote(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderId::Remote(s) | OrderId::Local(s) => s,
        }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update body for `PUT /api/orders/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<CancelledBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl OrderPatch {
    /// Plain status change
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Cancellation with an attached reason
    pub fn cancellation(reason: impl Into<String>, by: CancelledBy) -> Self {
        Self {
            status: Some(OrderStatus::Cancelled),
            cancellation_reason: Some(reason.into()),
            cancelled_by: Some(by),
            payment_status: None,
        }
    }

    /// Payment-state change only
    pub fn payment(status: PaymentStatus) -> Self {
        Self {
            payment_status: Some(status),
            ..Self::default()
        }
    }

    /// Apply this patch to an order record (used for local cache mirroring).
    pub fn apply(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(reason) = &self.cancellation_reason {
            order.cancellation_reason = Some(reason.clone());
        }
        if let Some(by) = self.cancelled_by {
            order.cancelled_by = Some(by);
        }
        if let Some(payment) = self.payment_status {
            order.payment_status = Some(payment);
        }
    }
}
