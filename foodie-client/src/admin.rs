//! Admin order console operations
//!
//! The operator may move an order to any defined status; only cancellation
//! demands a reason, collected before any request leaves the client. Every
//! successful remote change is mirrored into the local cache entry for that
//! order (when one exists) so a guest-path viewer sees it on next read.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use shared::models::order::{CancelledBy, Order, OrderPatch, OrderStatus, PaymentStatus};

use crate::repository::OrderRepository;
use crate::{ClientError, ClientResult};

/// Admin console over the order stores
pub struct AdminOrders {
    remote: Arc<dyn OrderRepository>,
    local: Arc<dyn OrderRepository>,
}

impl AdminOrders {
    pub fn new(remote: Arc<dyn OrderRepository>, local: Arc<dyn OrderRepository>) -> Self {
        Self { remote, local }
    }

    /// Merged order listing, newest first
    ///
    /// Local entries fill in offline/guest orders; remote records overwrite
    /// them per order number since the backend is authoritative.
    pub async fn list(&self) -> ClientResult<Vec<Order>> {
        let local = self.local.list().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read local orders");
            Vec::new()
        });
        let remote = match self.remote.list().await {
            Ok(orders) => orders,
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch remote orders, showing local only");
                Vec::new()
            }
        };

        let mut by_key: HashMap<String, Order> = HashMap::new();
        for order in local.into_iter().chain(remote) {
            if let Some(key) = order.order_number.clone().or_else(|| order.id.clone()) {
                by_key.insert(key, order);
            }
        }

        let mut orders: Vec<Order> = by_key.into_values().collect();
        orders.sort_by_key(|order| {
            std::cmp::Reverse(order.ordered_at.unwrap_or(DateTime::<Utc>::MIN_UTC))
        });
        Ok(orders)
    }

    /// Move an order to a new status
    ///
    /// Cancellation requires a non-empty reason and is rejected client-side
    /// without one; no request is issued in that case.
    pub async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
        reason: Option<&str>,
    ) -> ClientResult<Order> {
        let patch = if status == OrderStatus::Cancelled {
            let reason = reason
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .ok_or_else(|| {
                    ClientError::Validation(
                        "Please provide a reason for cancellation".to_string(),
                    )
                })?;
            OrderPatch::cancellation(reason, CancelledBy::Admin)
        } else {
            OrderPatch::status(status)
        };

        let updated = self.remote.update(id, &patch).await?;
        self.mirror(id, &patch).await;
        Ok(updated)
    }

    /// Change an order's payment state
    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> ClientResult<Order> {
        let patch = OrderPatch::payment(payment_status);
        let updated = self.remote.update(id, &patch).await?;
        self.mirror(id, &patch).await;
        Ok(updated)
    }

    /// Bulk clear: remote store first, then the local mirror, returning the
    /// remote removed count. The local mirror is cleared even when the
    /// remote call fails, matching the console's recovery behavior.
    pub async fn clear_all(&self) -> ClientResult<u64> {
        let result = self.remote.clear().await;
        if let Err(err) = self.local.clear().await {
            tracing::warn!(error = %err, "failed to clear local order cache");
        }
        result
    }

    /// Best-effort mirror into the local cache; a missing entry is normal
    /// (the order was never placed from this device).
    async fn mirror(&self, id: &str, patch: &OrderPatch) {
        match self.local.update(id, patch).await {
            Ok(_) | Err(ClientError::NotFound(_)) => {}
            Err(err) => {
                tracing::warn!(order_id = %id, error = %err, "failed to mirror update into local cache");
            }
        }
    }
}
