use serde::{Deserialize, Serialize};

use crate::models::order::Order;

/// Handshake payload (client -> server)
///
/// Carries the client's protocol version for server-side validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// Protocol version
    pub version: u16,
    /// Client name/identifier
    pub client_name: Option<String>,
    /// Client version
    pub client_version: Option<String>,
}

/// What happened to the order store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderAction {
    /// A single order's fields changed
    Update,
    /// The admin bulk-cleared the order store
    ClearAll,
}

/// Broadcast payload for `orders:update` events
///
/// The embedded order is a courtesy copy for notification text. Receivers
/// must re-fetch before treating any field as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdatePayload {
    pub action: OrderAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl OrderUpdatePayload {
    pub fn update(order: Order) -> Self {
        Self {
            action: OrderAction::Update,
            order: Some(order),
        }
    }

    pub fn clear_all() -> Self {
        Self {
            action: OrderAction::ClearAll,
            order: None,
        }
    }
}
