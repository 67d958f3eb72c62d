//! Persisted cart
//!
//! Cart contents live next to the order list in the local cache, one cart
//! per scope, so a dine-in table keeps its own cart. Line identity includes
//! the selected portion: a half plate and a full plate of the same dish are
//! distinct lines.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheResult, OrderCache};

/// A cart line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_id: String,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_portion: Option<String>,
    pub restaurant_id: String,
    pub restaurant_name: String,
}

impl CartItem {
    fn same_line(&self, item_id: &str, portion: Option<&str>) -> bool {
        self.item_id == item_id && self.selected_portion.as_deref() == portion
    }
}

/// Cart operations over the local cache
#[derive(Clone)]
pub struct Cart {
    cache: OrderCache,
}

impl Cart {
    pub fn new(cache: OrderCache) -> Self {
        Self { cache }
    }

    fn scope(&self) -> CacheResult<String> {
        self.cache.orders_scope()
    }

    /// Current cart contents
    pub fn items(&self) -> CacheResult<Vec<CartItem>> {
        let scope = self.scope()?;
        self.cache.cart_items(&scope)
    }

    /// Add an item, merging quantities into an existing matching line
    pub fn add(&self, item: CartItem) -> CacheResult<()> {
        let scope = self.scope()?;
        let mut items = self.cache.cart_items(&scope)?;

        let existing = items.iter_mut().find(|line| {
            line.same_line(&item.item_id, item.selected_portion.as_deref())
                && line.restaurant_id == item.restaurant_id
        });
        match existing {
            Some(line) => line.quantity += item.quantity,
            None => items.push(item),
        }

        self.cache.save_cart(&scope, &items)
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn set_quantity(
        &self,
        item_id: &str,
        portion: Option<&str>,
        quantity: i32,
    ) -> CacheResult<()> {
        let scope = self.scope()?;
        let mut items = self.cache.cart_items(&scope)?;

        if let Some(idx) = items.iter().position(|line| line.same_line(item_id, portion)) {
            if quantity <= 0 {
                items.remove(idx);
            } else {
                items[idx].quantity = quantity;
            }
            self.cache.save_cart(&scope, &items)?;
        }
        Ok(())
    }

    /// Remove a line entirely
    pub fn remove(&self, item_id: &str, portion: Option<&str>) -> CacheResult<()> {
        let scope = self.scope()?;
        let mut items = self.cache.cart_items(&scope)?;
        items.retain(|line| !line.same_line(item_id, portion));
        self.cache.save_cart(&scope, &items)
    }

    /// Empty the cart
    pub fn clear(&self) -> CacheResult<()> {
        let scope = self.scope()?;
        self.cache.save_cart(&scope, &[])
    }

    /// Sum of line totals
    pub fn total(&self) -> CacheResult<f64> {
        Ok(self
            .items()?
            .iter()
            .map(|line| line.price * line.quantity as f64)
            .sum())
    }

    /// Total unit count across lines
    pub fn item_count(&self) -> CacheResult<i32> {
        Ok(self.items()?.iter().map(|line| line.quantity).sum())
    }
}
