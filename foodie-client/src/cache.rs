//! redb-based local order cache
//!
//! The browser-localStorage analogue: a per-device persisted mirror of
//! orders placed by this session, used as the guest/offline fallback and
//! never authoritative once the remote record is reachable.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | scope | `Vec<Order>` (JSON) | Flat order list per scope |
//! | `cart` | scope | `Vec<CartItem>` (JSON) | Pending cart per scope |
//! | `session` | name | bytes | Table number, dine-in names, session blob |
//!
//! A scope is `"default"` for delivery sessions or `"table_{n}"` for a
//! dine-in session, so each table keeps its own order list and cart.
//!
//! Every write is a full-list read-modify-write inside a single write
//! transaction, which keeps concurrent async flows (checkout, admin mirror,
//! cancellation) from interleaving partial updates.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::client::Session;
use shared::models::order::{Order, OrderPatch};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::cart::CartItem;

/// Order lists: key = scope, value = JSON-serialized Vec<Order>
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Cart contents: key = scope, value = JSON-serialized Vec<CartItem>
const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

/// Session key-values: table number, per-table display name, session blob
const SESSION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

const TABLE_NUMBER_KEY: &str = "table_number";
const SESSION_KEY: &str = "session";

/// Default scope for delivery (non-table) sessions
pub const DEFAULT_SCOPE: &str = "default";

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Local order cache backed by redb
#[derive(Clone)]
pub struct OrderCache {
    db: Arc<Database>,
}

impl OrderCache {
    /// Open or create the cache database at the given path
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory cache (tests and examples)
    pub fn open_in_memory() -> CacheResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> CacheResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CART_TABLE)?;
            let _ = write_txn.open_table(SESSION_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// The scope the current session reads and writes: per-table for
    /// dine-in, the shared default otherwise.
    pub fn orders_scope(&self) -> CacheResult<String> {
        Ok(match self.table_number()? {
            Some(table) => format!("table_{}", table),
            None => DEFAULT_SCOPE.to_string(),
        })
    }

    // ========== Orders ==========

    /// Read the full order list for a scope (empty if none)
    pub fn orders(&self, scope: &str) -> CacheResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(scope)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Vec::new()),
        }
    }

    /// Find an order by local id or order number
    pub fn find_order(&self, scope: &str, id: &str) -> CacheResult<Option<Order>> {
        Ok(self
            .orders(scope)?
            .into_iter()
            .find(|order| order.matches_id(id)))
    }

    /// Insert or replace an order, matching existing entries by remote id
    /// or order number
    pub fn upsert_order(&self, scope: &str, order: &Order) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let mut orders: Vec<Order> = {
                match table.get(scope)? {
                    Some(guard) => serde_json::from_slice(guard.value())?,
                    None => Vec::new(),
                }
            };

            let pos = orders.iter().position(|existing| {
                order
                    .id
                    .as_deref()
                    .is_some_and(|id| existing.matches_id(id))
                    || order
                        .order_number
                        .as_deref()
                        .is_some_and(|n| existing.matches_id(n))
            });
            match pos {
                Some(idx) => orders[idx] = order.clone(),
                None => orders.push(order.clone()),
            }

            let bytes = serde_json::to_vec(&orders)?;
            table.insert(scope, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Apply a partial update to a cached order, returning the patched
    /// record if an entry matched
    pub fn update_order(
        &self,
        scope: &str,
        id: &str,
        patch: &OrderPatch,
    ) -> CacheResult<Option<Order>> {
        let mut updated = None;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let mut orders: Vec<Order> = {
                match table.get(scope)? {
                    Some(guard) => serde_json::from_slice(guard.value())?,
                    None => Vec::new(),
                }
            };

            if let Some(order) = orders.iter_mut().find(|order| order.matches_id(id)) {
                patch.apply(order);
                updated = Some(order.clone());
                let bytes = serde_json::to_vec(&orders)?;
                table.insert(scope, bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(updated)
    }

    /// Drop the order list for one scope, returning the number of entries
    /// removed
    pub fn clear_orders(&self, scope: &str) -> CacheResult<u64> {
        let mut removed = 0u64;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            if let Some(guard) = table.remove(scope)? {
                let orders: Vec<Order> = serde_json::from_slice(guard.value())?;
                removed = orders.len() as u64;
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    /// Drop every scope's order list (admin bulk clear), returning the
    /// total number of entries removed
    pub fn clear_all_orders(&self) -> CacheResult<u64> {
        let mut removed = 0u64;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let scopes: Vec<String> = {
                let mut keys = Vec::new();
                for entry in table.iter()? {
                    let (key, value) = entry?;
                    let orders: Vec<Order> = serde_json::from_slice(value.value())?;
                    removed += orders.len() as u64;
                    keys.push(key.value().to_string());
                }
                keys
            };
            for scope in scopes {
                table.remove(scope.as_str())?;
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    // ========== Cart ==========

    /// Read the cart for a scope (empty if none)
    pub fn cart_items(&self, scope: &str) -> CacheResult<Vec<CartItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;
        match table.get(scope)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the cart for a scope
    pub fn save_cart(&self, scope: &str, items: &[CartItem]) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CART_TABLE)?;
            if items.is_empty() {
                table.remove(scope)?;
            } else {
                let bytes = serde_json::to_vec(items)?;
                table.insert(scope, bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Session key-values ==========

    /// Active dine-in table number, if any
    pub fn table_number(&self) -> CacheResult<Option<String>> {
        self.get_string(TABLE_NUMBER_KEY)
    }

    /// Set or clear the active table number
    pub fn set_table_number(&self, table: Option<&str>) -> CacheResult<()> {
        match table {
            Some(value) => self.put_string(TABLE_NUMBER_KEY, value),
            None => self.remove_key(TABLE_NUMBER_KEY),
        }
    }

    /// Display name entered for a dine-in table
    pub fn dine_in_name(&self, table: &str) -> CacheResult<Option<String>> {
        self.get_string(&format!("dine_in_name_{}", table))
    }

    pub fn set_dine_in_name(&self, table: &str, name: &str) -> CacheResult<()> {
        self.put_string(&format!("dine_in_name_{}", table), name)
    }

    /// Persisted session blob (token + user)
    pub fn session(&self) -> CacheResult<Option<Session>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSION_TABLE)?;
        match table.get(SESSION_KEY)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn set_session(&self, session: &Session) -> CacheResult<()> {
        let bytes = serde_json::to_vec(session)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SESSION_TABLE)?;
            table.insert(SESSION_KEY, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn clear_session(&self) -> CacheResult<()> {
        self.remove_key(SESSION_KEY)
    }

    fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSION_TABLE)?;
        Ok(table
            .get(key)?
            .map(|guard| String::from_utf8_lossy(guard.value()).into_owned()))
    }

    fn put_string(&self, key: &str, value: &str) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SESSION_TABLE)?;
            table.insert(key, value.as_bytes())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_key(&self, key: &str) -> CacheResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SESSION_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::client::UserInfo;
    use shared::models::order::{CancelledBy, OrderStatus};

    fn sample_order(number: &str) -> Order {
        Order {
            order_number: Some(number.to_string()),
            restaurant_name: "Spice Route".to_string(),
            total: 420.0,
            status: OrderStatus::Pending,
            ..Order::default()
        }
    }

    #[test]
    fn test_upsert_and_find() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
            .unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD2"))
            .unwrap();

        assert_eq!(cache.orders(DEFAULT_SCOPE).unwrap().len(), 2);
        let found = cache.find_order(DEFAULT_SCOPE, "ORD2").unwrap().unwrap();
        assert_eq!(found.order_number.as_deref(), Some("ORD2"));
        assert!(cache.find_order(DEFAULT_SCOPE, "ORD9").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_matching_entry() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
            .unwrap();

        // Remote record for the same order number supersedes the local one
        let mut remote = sample_order("ORD1");
        remote.id = Some("64b1f0c2a9d3e45f6a7b8c9d".to_string());
        remote.status = OrderStatus::Confirmed;
        cache.upsert_order(DEFAULT_SCOPE, &remote).unwrap();

        let orders = cache.orders(DEFAULT_SCOPE).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Confirmed);
        assert!(orders[0].id.is_some());
    }

    #[test]
    fn test_update_order_applies_patch() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
            .unwrap();

        let patch = OrderPatch::cancellation("out of stock", CancelledBy::Admin);
        let updated = cache
            .update_order(DEFAULT_SCOPE, "ORD1", &patch)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(updated.cancellation_reason.as_deref(), Some("out of stock"));

        // No matching entry leaves the cache untouched
        assert!(cache
            .update_order(DEFAULT_SCOPE, "ORD9", &patch)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_scopes_are_independent() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
            .unwrap();
        cache.upsert_order("table_5", &sample_order("ORD2")).unwrap();

        assert_eq!(cache.orders(DEFAULT_SCOPE).unwrap().len(), 1);
        assert_eq!(cache.orders("table_5").unwrap().len(), 1);

        assert_eq!(cache.clear_orders("table_5").unwrap(), 1);
        assert_eq!(cache.orders("table_5").unwrap().len(), 0);
        assert_eq!(cache.orders(DEFAULT_SCOPE).unwrap().len(), 1);
    }

    #[test]
    fn test_clear_all_orders_counts_every_scope() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
            .unwrap();
        cache.upsert_order("table_2", &sample_order("ORD2")).unwrap();
        cache.upsert_order("table_2", &sample_order("ORD3")).unwrap();

        assert_eq!(cache.clear_all_orders().unwrap(), 3);
        assert_eq!(cache.orders(DEFAULT_SCOPE).unwrap().len(), 0);
        assert_eq!(cache.orders("table_2").unwrap().len(), 0);
    }

    #[test]
    fn test_orders_scope_follows_table_number() {
        let cache = OrderCache::open_in_memory().unwrap();
        assert_eq!(cache.orders_scope().unwrap(), DEFAULT_SCOPE);

        cache.set_table_number(Some("7")).unwrap();
        assert_eq!(cache.orders_scope().unwrap(), "table_7");

        cache.set_table_number(None).unwrap();
        assert_eq!(cache.orders_scope().unwrap(), DEFAULT_SCOPE);
    }

    #[test]
    fn test_session_round_trip() {
        let cache = OrderCache::open_in_memory().unwrap();
        assert!(cache.session().unwrap().is_none());

        let session = Session {
            token: "jwt".to_string(),
            user: UserInfo {
                id: "64b1f0c2a9d3e45f6a7b8c00".to_string(),
                name: "Asha".to_string(),
                email: None,
            },
        };
        cache.set_session(&session).unwrap();
        assert_eq!(
            cache.session().unwrap().unwrap().user_id(),
            "64b1f0c2a9d3e45f6a7b8c00"
        );

        cache.clear_session().unwrap();
        assert!(cache.session().unwrap().is_none());
    }

    #[test]
    fn test_dine_in_name_per_table() {
        let cache = OrderCache::open_in_memory().unwrap();
        cache.set_dine_in_name("3", "Priya").unwrap();
        assert_eq!(cache.dine_in_name("3").unwrap().as_deref(), Some("Priya"));
        assert!(cache.dine_in_name("4").unwrap().is_none());
    }

    #[test]
    fn test_on_disk_cache_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.redb");
        {
            let cache = OrderCache::open(&path).unwrap();
            cache
                .upsert_order(DEFAULT_SCOPE, &sample_order("ORD1"))
                .unwrap();
        }
        let cache = OrderCache::open(&path).unwrap();
        assert_eq!(cache.orders(DEFAULT_SCOPE).unwrap().len(), 1);
    }
}
