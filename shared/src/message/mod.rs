//! Push-channel message types
//!
//! Shared between the server's broadcast side and client listeners, for
//! both network (TCP) and in-process transports. Events on this channel are
//! advisory: they tell a client that an order changed, and clients confirm
//! through a pull-based re-fetch rather than trusting the pushed fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Protocol version, checked during the handshake
pub const PROTOCOL_VERSION: u16 = 1;

/// Push-channel event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Handshake message
    Handshake = 0,
    /// An order record changed
    OrderUpdate = 1,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::OrderUpdate),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::OrderUpdate => write!(f, "orders:update"),
        }
    }
}

/// Framed push-channel message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            payload,
        }
    }

    /// Create a handshake message
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            EventType::Handshake,
            serde_json::to_vec(payload).expect("Failed to serialize handshake payload"),
        )
    }

    /// Create an order-update broadcast
    pub fn order_update(payload: &OrderUpdatePayload) -> Self {
        Self::new(
            EventType::OrderUpdate,
            serde_json::to_vec(payload).expect("Failed to serialize order update"),
        )
    }

    /// Parse the payload as the given type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{Order, OrderStatus};

    #[test]
    fn test_handshake_message() {
        let payload = HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: Some("test-client".to_string()),
            client_version: Some("0.1.0".to_string()),
        };

        let msg = BusMessage::handshake(&payload);
        assert_eq!(msg.event_type, EventType::Handshake);
        assert!(!msg.request_id.is_nil());

        let parsed: HandshakePayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_order_update_round_trip() {
        let order = Order {
            id: Some("64b1f0c2a9d3e45f6a7b8c9d".to_string()),
            status: OrderStatus::Preparing,
            ..Order::default()
        };
        let msg = BusMessage::order_update(&OrderUpdatePayload::update(order));

        let parsed: OrderUpdatePayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.action, OrderAction::Update);
        assert_eq!(
            parsed.order.unwrap().id.as_deref(),
            Some("64b1f0c2a9d3e45f6a7b8c9d")
        );
    }

    #[test]
    fn test_event_type_from_u8() {
        assert_eq!(EventType::try_from(0), Ok(EventType::Handshake));
        assert_eq!(EventType::try_from(1), Ok(EventType::OrderUpdate));
        assert!(EventType::try_from(7).is_err());
    }
}
