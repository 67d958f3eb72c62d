//! Foodie Client - order tracking and reconciliation
//!
//! Client library for the Foodie ordering backend: a typed HTTP client, a
//! redb-backed local order cache for guest/offline continuity, and the
//! tracking machinery that keeps a view current — point lookups with a
//! local-cache fallback, fixed-interval polling, and a push-event listener
//! whose events only ever trigger pull-based re-fetches.

pub mod active;
pub mod admin;
pub mod cache;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod http;
pub mod notify;
pub mod poll;
pub mod repository;
pub mod tracker;
pub mod util;

pub use active::ActiveOrders;
pub use admin::AdminOrders;
pub use cache::{CacheError, OrderCache};
pub use cart::{Cart, CartItem};
pub use checkout::{Checkout, CheckoutRequest};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use events::{EventError, EventListener, ListenerScope, MemoryTransport, TcpTransport, Transport};
pub use fetch::{FetchSource, FetchedOrder, OrderFetcher};
pub use http::HttpClient;
pub use notify::{LogNotifier, Notifier, OrderNotification};
pub use poll::StatusPoller;
pub use repository::{LocalOrders, OrderRepository, RemoteOrders};
pub use tracker::{OrderTracker, TrackingState};

// Re-export shared types for convenience
pub use shared::models::order::{Order, OrderId, OrderItem, OrderStatus, TimelineView};
