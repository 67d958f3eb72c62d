//! Real-time push channel
//!
//! A long-lived subscription advising the client that order records changed.
//! Events carry a courtesy copy of the order for notification text, but
//! every display update goes through a pull-based re-fetch; the channel is
//! never the authoritative source of field values.

use thiserror::Error;

pub mod listener;
pub mod transport;

pub use listener::{EventListener, ListenerScope};
pub use transport::{MemoryTransport, TcpTransport, Transport};

/// Push-channel errors
#[derive(Debug, Error)]
pub enum EventError {
    /// I/O failure on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection-level failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed frame or payload
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Payload (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
