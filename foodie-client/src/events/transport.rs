//! Transport abstraction for the push channel

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use shared::message::{BusMessage, EventType};

use super::EventError;

/// Transport abstraction for push-channel communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<BusMessage, EventError>;
    async fn write_message(&self, msg: &BusMessage) -> Result<(), EventError>;
    async fn close(&self) -> Result<(), EventError>;
}

/// Read one framed message:
/// event type (1 byte) + request id (16 bytes) + payload length (4 bytes LE) + payload
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<BusMessage, EventError> {
    let mut type_buf = [0u8; 1];
    reader.read_exact(&mut type_buf).await?;
    let event_type = EventType::try_from(type_buf[0])
        .map_err(|_| EventError::InvalidMessage("Invalid event type".into()))?;

    let mut uuid_buf = [0u8; 16];
    reader.read_exact(&mut uuid_buf).await?;
    let request_id = Uuid::from_bytes(uuid_buf);

    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(BusMessage {
        request_id,
        event_type,
        payload,
    })
}

/// Write one framed message (same layout as [`read_frame`])
pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &BusMessage,
) -> Result<(), EventError> {
    let mut data = Vec::with_capacity(21 + msg.payload.len());
    data.push(msg.event_type as u8);
    data.extend_from_slice(msg.request_id.as_bytes());
    data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&msg.payload);

    writer.write_all(&data).await?;
    Ok(())
}

/// TCP Transport Implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, EventError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| EventError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<BusMessage, EventError> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader).await
    }

    async fn write_message(&self, msg: &BusMessage) -> Result<(), EventError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg).await
    }

    async fn close(&self) -> Result<(), EventError> {
        // Dropping the Arc references will eventually close the stream
        Ok(())
    }
}

/// Memory Transport Implementation (for in-process communication and tests)
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Receiver for messages FROM the server (broadcasts)
    rx: Arc<Mutex<broadcast::Receiver<BusMessage>>>,
    /// Sender for messages TO the server
    tx: broadcast::Sender<BusMessage>,
}

impl MemoryTransport {
    /// Create a new memory transport
    ///
    /// # Arguments
    /// * `server_broadcast_tx` - The server's broadcast sender (to subscribe to updates)
    /// * `client_to_server_tx` - The channel to send messages TO the server
    pub fn new(
        server_broadcast_tx: &broadcast::Sender<BusMessage>,
        client_to_server_tx: &broadcast::Sender<BusMessage>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(server_broadcast_tx.subscribe())),
            tx: client_to_server_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<BusMessage, EventError> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| EventError::Connection(format!("Memory channel error: {}", e)))
    }

    async fn write_message(&self, msg: &BusMessage) -> Result<(), EventError> {
        self.tx
            .send(msg.clone())
            .map_err(|e| EventError::Connection(format!("Failed to send to server: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), EventError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{OrderUpdatePayload, PROTOCOL_VERSION};
    use shared::models::order::Order;

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let msg = BusMessage::order_update(&OrderUpdatePayload::update(Order {
            order_number: Some("ORD1".to_string()),
            ..Order::default()
        }));
        write_frame(&mut server, &msg).await.unwrap();

        let read = read_frame(&mut client).await.unwrap();
        assert_eq!(read, msg);
        let payload: OrderUpdatePayload = read.parse_payload().unwrap();
        assert_eq!(payload.order.unwrap().order_number.as_deref(), Some("ORD1"));
    }

    #[tokio::test]
    async fn test_frame_rejects_unknown_event_type() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let mut bytes = vec![0xFFu8];
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        tokio::io::AsyncWriteExt::write_all(&mut server, &bytes)
            .await
            .unwrap();

        let result = read_frame(&mut client).await;
        assert!(matches!(result, Err(EventError::InvalidMessage(_))));
    }

    #[tokio::test]
    async fn test_memory_transport_both_directions() {
        let (server_tx, _server_keep) = broadcast::channel(16);
        let (client_tx, mut to_server_rx) = broadcast::channel(16);
        let transport = MemoryTransport::new(&server_tx, &client_tx);

        // server -> client
        let update = BusMessage::order_update(&OrderUpdatePayload::clear_all());
        server_tx.send(update.clone()).unwrap();
        assert_eq!(transport.read_message().await.unwrap(), update);

        // client -> server
        let handshake = BusMessage::handshake(&shared::message::HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: Some("test".to_string()),
            client_version: None,
        });
        transport.write_message(&handshake).await.unwrap();
        assert_eq!(
            to_server_rx.recv().await.unwrap().event_type,
            EventType::Handshake
        );
    }
}
