//! User-visible notifications
//!
//! The toast/alert analogue. Notifications are fire-and-forget: a sink that
//! fails to display (e.g. an audible alert blocked by the platform) must not
//! affect order-state handling, so the trait returns nothing.

use shared::models::order::Order;

/// A transient user-visible notification
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub title: String,
    pub body: String,
    /// Lookup key of the order this concerns, for "View" style actions
    pub order_key: Option<String>,
}

impl OrderNotification {
    /// Status-change toast for a pushed order update
    pub fn status_change(order: &Order) -> Self {
        let number = order
            .order_number
            .as_deref()
            .or(order.id.as_deref())
            .unwrap_or("?");
        Self {
            title: "Order update".to_string(),
            body: format!("Order #{} is now {}", number, order.status),
            order_key: order.key().map(str::to_string),
        }
    }

    /// Confirmation toast after a successful cancellation
    pub fn cancelled(order: &Order) -> Self {
        Self {
            title: "Order cancelled".to_string(),
            body: "Order cancelled successfully".to_string(),
            order_key: order.key().map(str::to_string),
        }
    }

    /// Error toast carrying a server-provided message verbatim
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Something went wrong".to_string(),
            body: message.into(),
            order_key: None,
        }
    }
}

/// Notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, note: &OrderNotification);
}

/// Default sink that logs through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, note: &OrderNotification) {
        tracing::info!(title = %note.title, body = %note.body, "notification");
    }
}
