//! Active-order lookup
//!
//! Backs the "you have an order in progress" surface: the newest order still
//! moving through the pipeline, chosen from the local scope list and, for a
//! signed-in user, their remote orders. The remote candidate wins when both
//! exist; a remote failure quietly degrades to the local candidate.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use shared::models::order::Order;

use crate::cache::OrderCache;
use crate::repository::OrderRepository;
use crate::ClientResult;

/// Active-order check over the order stores
pub struct ActiveOrders {
    remote: Arc<dyn OrderRepository>,
    cache: OrderCache,
}

impl ActiveOrders {
    pub fn new(remote: Arc<dyn OrderRepository>, cache: OrderCache) -> Self {
        Self { remote, cache }
    }

    /// The order to surface, if any
    pub async fn current(&self) -> ClientResult<Option<Order>> {
        let scope = self.cache.orders_scope()?;
        // Scanned from the tail: the most recently placed active entry
        let local_candidate = self
            .cache
            .orders(&scope)?
            .into_iter()
            .rev()
            .find(|order| order.status.is_active());

        let mut remote_candidate = None;
        if let Some(session) = self.cache.session()? {
            match self.remote.list().await {
                Ok(orders) => {
                    remote_candidate = orders
                        .into_iter()
                        .filter(|order| {
                            order.user_id.as_deref() == Some(session.user_id())
                                && order.status.is_active()
                        })
                        .max_by_key(|order| {
                            order.ordered_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
                        });
                }
                Err(err) => {
                    tracing::debug!(error = %err, "active-order check falling back to local");
                }
            }
        }

        Ok(remote_candidate.or(local_candidate))
    }
}
