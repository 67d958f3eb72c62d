//! Real-time order-update listener
//!
//! Subscribes to the push channel and fans matched events out to in-process
//! consumers. Matching is by viewer: a customer session only sees events for
//! its own user id, the admin console sees everything. A matched event emits
//! a notification and is forwarded so tracking views can re-fetch; the
//! pushed order copy itself is never written to display state.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::message::{
    BusMessage, EventType, HandshakePayload, OrderUpdatePayload, PROTOCOL_VERSION,
};

use super::transport::{TcpTransport, Transport};
use super::EventError;
use crate::notify::{Notifier, OrderNotification};

/// Which events concern this viewer
#[derive(Debug, Clone)]
pub enum ListenerScope {
    /// Only events for orders belonging to this user id
    User(String),
    /// Every event (admin console)
    Admin,
}

impl ListenerScope {
    fn matches(&self, payload: &OrderUpdatePayload) -> bool {
        match self {
            ListenerScope::Admin => true,
            ListenerScope::User(user_id) => {
                payload
                    .order
                    .as_ref()
                    .and_then(|order| order.user_id.as_deref())
                    == Some(user_id.as_str())
            }
        }
    }
}

/// Handle to a running push-channel subscription
pub struct EventListener {
    token: CancellationToken,
    event_tx: broadcast::Sender<OrderUpdatePayload>,
}

impl EventListener {
    /// Connect over TCP, perform the protocol handshake, and start listening
    ///
    /// Reconnection is the caller's concern; when the underlying stream
    /// fails the listen loop ends and a fresh `connect` is needed.
    pub async fn connect(
        addr: &str,
        client_name: &str,
        scope: ListenerScope,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, EventError> {
        let transport = TcpTransport::connect(addr).await?;

        let payload = HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: Some(client_name.to_string()),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        };
        transport
            .write_message(&BusMessage::handshake(&payload))
            .await?;

        Ok(Self::spawn(Arc::new(transport), scope, notifier))
    }

    /// Start the listen loop over an established transport
    pub fn spawn(
        transport: Arc<dyn Transport>,
        scope: ListenerScope,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let token = CancellationToken::new();
        let child = token.child_token();
        let tx = event_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        let _ = transport.close().await;
                        break;
                    }
                    msg = transport.read_message() => match msg {
                        Ok(msg) if msg.event_type == EventType::OrderUpdate => {
                            match msg.parse_payload::<OrderUpdatePayload>() {
                                Ok(payload) => {
                                    if !scope.matches(&payload) {
                                        continue;
                                    }
                                    if let Some(order) = &payload.order {
                                        // Fire and forget; display state comes
                                        // from the pull path
                                        notifier.notify(&OrderNotification::status_change(order));
                                    }
                                    if tx.send(payload).is_err() {
                                        tracing::debug!("no subscribers for order update");
                                    }
                                }
                                Err(err) => {
                                    tracing::warn!(error = %err, "malformed order update payload");
                                }
                            }
                        }
                        Ok(msg) => {
                            tracing::trace!(event = %msg.event_type, "ignoring push message");
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "push channel read failed");
                            break;
                        }
                    }
                }
            }
        });

        Self { token, event_tx }
    }

    /// Subscribe to matched order-update events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderUpdatePayload> {
        self.event_tx.subscribe()
    }

    /// Tear down the subscription (unmount/logout)
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
