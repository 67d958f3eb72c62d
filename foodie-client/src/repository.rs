//! Order repository abstraction
//!
//! One capability interface over order records, with a remote (HTTP) and a
//! local (cache) implementation. The tracking machinery, checkout, and the
//! admin console all depend on this trait only, which is also what makes
//! the reconciliation rules testable without a live backend.

use async_trait::async_trait;
use shared::models::order::{Order, OrderPatch};
use shared::response::ApiResponse;

use crate::cache::OrderCache;
use crate::{ClientError, ClientResult, HttpClient};

/// Capability interface over a store of order records
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Point lookup by remote id or order number
    async fn get(&self, id: &str) -> ClientResult<Order>;

    /// All records visible to the caller
    async fn list(&self) -> ClientResult<Vec<Order>>;

    /// Insert a new record or replace an existing one
    async fn upsert(&self, order: &Order) -> ClientResult<Order>;

    /// Apply a partial update (status, cancellation, payment state)
    async fn update(&self, id: &str, patch: &OrderPatch) -> ClientResult<Order>;

    /// Remove every record, returning the removed count
    async fn clear(&self) -> ClientResult<u64>;
}

/// Remote order store backed by the backend HTTP API
#[derive(Debug, Clone)]
pub struct RemoteOrders {
    http: HttpClient,
}

impl RemoteOrders {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl OrderRepository for RemoteOrders {
    async fn get(&self, id: &str) -> ClientResult<Order> {
        self.http.order(id).await
    }

    async fn list(&self) -> ClientResult<Vec<Order>> {
        self.http.orders().await
    }

    async fn upsert(&self, order: &Order) -> ClientResult<Order> {
        match &order.id {
            Some(id) => self
                .http
                .put::<ApiResponse<Order>, _>(&format!("/api/orders/{}", id), order)
                .await?
                .data
                .ok_or_else(|| ClientError::InvalidResponse("Missing order data".to_string())),
            None => self.http.create_order(order).await,
        }
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> ClientResult<Order> {
        self.http.update_order(id, patch).await
    }

    async fn clear(&self) -> ClientResult<u64> {
        self.http.clear_orders().await
    }
}

/// Local order store over the cache, scoped to the active session
/// (per-table for dine-in, the shared default otherwise)
#[derive(Clone)]
pub struct LocalOrders {
    cache: OrderCache,
}

impl LocalOrders {
    pub fn new(cache: OrderCache) -> Self {
        Self { cache }
    }

    fn scope(&self) -> ClientResult<String> {
        Ok(self.cache.orders_scope()?)
    }
}

#[async_trait]
impl OrderRepository for LocalOrders {
    async fn get(&self, id: &str) -> ClientResult<Order> {
        let scope = self.scope()?;
        self.cache
            .find_order(&scope, id)?
            .ok_or_else(|| ClientError::NotFound(format!("Order not found: {}", id)))
    }

    async fn list(&self) -> ClientResult<Vec<Order>> {
        let scope = self.scope()?;
        Ok(self.cache.orders(&scope)?)
    }

    async fn upsert(&self, order: &Order) -> ClientResult<Order> {
        let scope = self.scope()?;
        self.cache.upsert_order(&scope, order)?;
        Ok(order.clone())
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> ClientResult<Order> {
        let scope = self.scope()?;
        self.cache
            .update_order(&scope, id, patch)?
            .ok_or_else(|| ClientError::NotFound(format!("Order not found: {}", id)))
    }

    async fn clear(&self) -> ClientResult<u64> {
        Ok(self.cache.clear_all_orders()?)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Deny {
        Unauthorized,
        Internal,
    }

    /// In-memory repository with call counters, standing in for a store in
    /// reconciliation tests.
    pub(crate) struct MockOrders {
        orders: Mutex<Vec<Order>>,
        deny: Mutex<Option<Deny>>,
        pub get_calls: AtomicUsize,
        pub update_calls: AtomicUsize,
    }

    impl MockOrders {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                orders: Mutex::new(Vec::new()),
                deny: Mutex::new(None),
                get_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
            })
        }

        pub fn insert(&self, order: Order) {
            self.orders.lock().unwrap().push(order);
        }

        /// Reject every call with `Unauthorized`
        pub fn deny_unauthorized(&self) {
            *self.deny.lock().unwrap() = Some(Deny::Unauthorized);
        }

        /// Reject every call with `Internal`
        pub fn deny_internal(&self) {
            *self.deny.lock().unwrap() = Some(Deny::Internal);
        }

        fn check_deny(&self) -> ClientResult<()> {
            match *self.deny.lock().unwrap() {
                Some(Deny::Unauthorized) => Err(ClientError::Unauthorized),
                Some(Deny::Internal) => Err(ClientError::Internal("server error".to_string())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrders {
        async fn get(&self, id: &str) -> ClientResult<Order> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.check_deny()?;
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|order| order.matches_id(id))
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("Order not found: {}", id)))
        }

        async fn list(&self) -> ClientResult<Vec<Order>> {
            self.check_deny()?;
            Ok(self.orders.lock().unwrap().clone())
        }

        async fn upsert(&self, order: &Order) -> ClientResult<Order> {
            self.check_deny()?;
            let mut orders = self.orders.lock().unwrap();
            let pos = orders.iter().position(|existing| {
                order
                    .key()
                    .is_some_and(|key| existing.matches_id(key))
            });
            match pos {
                Some(idx) => orders[idx] = order.clone(),
                None => orders.push(order.clone()),
            }
            Ok(order.clone())
        }

        async fn update(&self, id: &str, patch: &OrderPatch) -> ClientResult<Order> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            self.check_deny()?;
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|order| order.matches_id(id))
                .ok_or_else(|| ClientError::NotFound(format!("Order not found: {}", id)))?;
            patch.apply(order);
            Ok(order.clone())
        }

        async fn clear(&self) -> ClientResult<u64> {
            self.check_deny()?;
            let mut orders = self.orders.lock().unwrap();
            let removed = orders.len() as u64;
            orders.clear();
            Ok(removed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::order::OrderStatus;

    #[tokio::test]
    async fn test_local_orders_round_trip() {
        let cache = OrderCache::open_in_memory().unwrap();
        let repo = LocalOrders::new(cache);

        let order = Order {
            order_number: Some("ORD1".to_string()),
            status: OrderStatus::Pending,
            ..Order::default()
        };
        repo.upsert(&order).await.unwrap();

        let found = repo.get("ORD1").await.unwrap();
        assert_eq!(found.order_number.as_deref(), Some("ORD1"));

        let patched = repo
            .update("ORD1", &OrderPatch::status(OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(patched.status, OrderStatus::Delivered);

        assert_eq!(repo.clear().await.unwrap(), 1);
        assert!(matches!(
            repo.get("ORD1").await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_local_update_missing_entry_is_not_found() {
        let repo = LocalOrders::new(OrderCache::open_in_memory().unwrap());
        let result = repo
            .update("ORD9", &OrderPatch::status(OrderStatus::Confirmed))
            .await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }
}
