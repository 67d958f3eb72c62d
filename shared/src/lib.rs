//! Shared types for the Foodie ordering system
//!
//! Common types used by the client library and any server-side consumer:
//! the order model and its status lifecycle, push-channel message types,
//! response structures, and session types.

pub mod client;
pub mod message;
pub mod models;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Order model re-exports (for convenient access)
pub use models::order::{
    CancelledBy, Order, OrderId, OrderItem, OrderPatch, OrderStatus, OrderType, PaymentMethod,
    PaymentStatus, TimelineView,
};

// Message bus re-exports
pub use message::{BusMessage, EventType};
