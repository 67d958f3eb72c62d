//! Order lookup with local-cache fallback
//!
//! The remote record is authoritative whenever it is reachable. A tracking
//! session falls back to the local cache only when the remote lookup is
//! rejected for authorization (guest orders are expected to hit this) or
//! the identifier is not shaped like a remote id at all. Once a session has
//! fallen back it stays on the local source; flapping between sources would
//! let a stale mirror overwrite remote truth mid-view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shared::models::order::{Order, OrderId};

use crate::repository::OrderRepository;
use crate::ClientResult;

/// Which store produced the order record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Remote,
    Local,
}

/// A fetched order plus its provenance
#[derive(Debug, Clone)]
pub struct FetchedOrder {
    pub order: Order,
    pub source: FetchSource,
}

/// Per-tracking-session order lookup
pub struct OrderFetcher {
    remote: Arc<dyn OrderRepository>,
    local: Arc<dyn OrderRepository>,
    pinned_local: AtomicBool,
}

impl OrderFetcher {
    pub fn new(remote: Arc<dyn OrderRepository>, local: Arc<dyn OrderRepository>) -> Self {
        Self {
            remote,
            local,
            pinned_local: AtomicBool::new(false),
        }
    }

    /// Whether this session has fallen back to the local cache
    pub fn is_pinned_local(&self) -> bool {
        self.pinned_local.load(Ordering::Acquire)
    }

    /// Look up the order, remote first, local on the defined fallback
    /// conditions. A `NotFound` result is terminal for the caller.
    pub async fn fetch(&self, id: &str) -> ClientResult<FetchedOrder> {
        if self.is_pinned_local() {
            return self.fetch_local(id).await;
        }

        match self.remote.get(id).await {
            Ok(order) => Ok(FetchedOrder {
                order,
                source: FetchSource::Remote,
            }),
            Err(err) => {
                let fallback = err.is_unauthorized() || !OrderId::parse(id).is_remote();
                if fallback {
                    self.pinned_local.store(true, Ordering::Release);
                    tracing::debug!(
                        order_id = %id,
                        error = %err,
                        "remote lookup unavailable, pinning session to local cache"
                    );
                    self.fetch_local(id).await
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn fetch_local(&self, id: &str) -> ClientResult<FetchedOrder> {
        let order = self.local.get(id).await?;
        Ok(FetchedOrder {
            order,
            source: FetchSource::Local,
        })
    }
}
