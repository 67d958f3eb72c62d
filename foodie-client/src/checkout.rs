//! Checkout
//!
//! Turns the persisted cart into a pending order: generates the readable
//! order number, submits to the backend, and mirrors the result into the
//! local cache so a guest can keep tracking it from this device.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;

use shared::models::order::{
    Order, OrderItem, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};

use crate::cache::OrderCache;
use crate::cart::Cart;
use crate::repository::OrderRepository;
use crate::{ClientError, ClientResult};

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Checkout input collected from the customer
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    /// Required for delivery orders; ignored for dine-in
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

/// Checkout flow over the cart and order stores
pub struct Checkout {
    remote: Arc<dyn OrderRepository>,
    cache: OrderCache,
}

impl Checkout {
    pub fn new(remote: Arc<dyn OrderRepository>, cache: OrderCache) -> Self {
        Self { remote, cache }
    }

    /// Place the order currently in the cart
    ///
    /// Dine-in is inferred from the active table number. When the backend
    /// refuses the submission for authorization (guest session), the order
    /// is kept locally under its generated number so tracking still works;
    /// any other rejection leaves the cart untouched and propagates.
    pub async fn place_order(&self, request: CheckoutRequest) -> ClientResult<Order> {
        let cart = Cart::new(self.cache.clone());
        let items = cart.items()?;
        if items.is_empty() {
            return Err(ClientError::Validation("Your cart is empty".to_string()));
        }

        let table_number = self.cache.table_number()?;
        if table_number.is_none() && request.delivery_address.is_none() {
            return Err(ClientError::Validation(
                "Please select a delivery address".to_string(),
            ));
        }

        let session = self.cache.session()?;
        let customer_name = match (&session, &table_number) {
            (Some(session), _) => Some(session.user.name.clone()),
            (None, Some(table)) => self.cache.dine_in_name(table)?,
            (None, None) => None,
        };

        let total: f64 = items.iter().map(|line| line.price * line.quantity as f64).sum();
        let order = Order {
            order_number: Some(generate_order_number()),
            user_id: Some(
                session
                    .map(|session| session.user.id)
                    .unwrap_or_else(|| "guest".to_string()),
            ),
            restaurant_name: items[0].restaurant_name.clone(),
            items: items
                .iter()
                .map(|line| OrderItem {
                    item_id: Some(line.item_id.clone()),
                    name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    selected_portion: line.selected_portion.clone(),
                })
                .collect(),
            total,
            subtotal: Some(total),
            status: OrderStatus::Pending,
            order_type: if table_number.is_some() {
                OrderType::DineIn
            } else {
                OrderType::Delivery
            },
            table_number: table_number.clone(),
            payment_method: Some(request.payment_method),
            payment_status: Some(PaymentStatus::Pending),
            customer_name: Some(customer_name.unwrap_or_else(|| "Guest".to_string())),
            delivery_address: request.delivery_address,
            notes: request.notes,
            ordered_at: Some(Utc::now()),
            ..Order::default()
        };

        let scope = self.cache.orders_scope()?;
        match self.remote.upsert(&order).await {
            Ok(saved) => {
                self.cache.upsert_order(&scope, &saved)?;
                cart.clear()?;
                Ok(saved)
            }
            Err(err) if err.is_unauthorized() => {
                tracing::debug!(
                    order_number = order.order_number.as_deref().unwrap_or(""),
                    "backend refused guest submission, keeping order locally"
                );
                self.cache.upsert_order(&scope, &order)?;
                cart.clear()?;
                Ok(order)
            }
            Err(err) => Err(err),
        }
    }
}

/// Readable order number: `ORD` + base-36 timestamp + 3 random base-36 chars
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..3)
        .map(|_| BASE36_DIGITS[rng.gen_range(0..36)] as char)
        .collect();
    format!("ORD{}{}", base36(millis), suffix)
}

fn base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::repository::mock::MockOrders;
    use shared::client::{Session, UserInfo};
    use shared::models::order::OrderId;

    fn line(item_id: &str, price: f64, quantity: i32) -> CartItem {
        CartItem {
            item_id: item_id.to_string(),
            name: "Masala Dosa".to_string(),
            price,
            quantity,
            selected_portion: None,
            restaurant_id: "r1".to_string(),
            restaurant_name: "Spice Route".to_string(),
        }
    }

    fn delivery_request() -> CheckoutRequest {
        CheckoutRequest {
            payment_method: PaymentMethod::Cash,
            delivery_address: Some("12 MG Road, Bengaluru".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD"));
        assert!(number.len() > 6);
        assert!(number[3..]
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
        // Generated numbers are local identifiers, never remote-shaped
        assert!(!OrderId::parse(&number).is_remote());
    }

    #[test]
    fn test_base36_round_trip() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "Z");
        assert_eq!(base36(36), "10");
        assert_eq!(u128::from_str_radix(&base36(1715000000000), 36).unwrap(), 1715000000000);
    }

    #[tokio::test]
    async fn test_place_order_submits_and_mirrors() {
        let remote = MockOrders::new();
        let cache = OrderCache::open_in_memory().unwrap();
        let cart = Cart::new(cache.clone());
        cart.add(line("m1", 120.0, 2)).unwrap();
        cart.add(line("m2", 60.0, 1)).unwrap();

        let checkout = Checkout::new(remote.clone(), cache.clone());
        let order = checkout.place_order(delivery_request()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, OrderType::Delivery);
        assert_eq!(order.total, 300.0);
        assert_eq!(order.user_id.as_deref(), Some("guest"));

        // Mirrored locally, cart emptied
        let key = order.order_number.as_deref().unwrap();
        assert!(cache.find_order("default", key).unwrap().is_some());
        assert!(cart.items().unwrap().is_empty());
        assert_eq!(remote.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dine_in_inferred_from_table_number() {
        let remote = MockOrders::new();
        let cache = OrderCache::open_in_memory().unwrap();
        cache.set_table_number(Some("7")).unwrap();
        cache.set_dine_in_name("7", "Priya").unwrap();
        Cart::new(cache.clone()).add(line("m1", 120.0, 1)).unwrap();

        let checkout = Checkout::new(remote, cache.clone());
        let order = checkout
            .place_order(CheckoutRequest {
                payment_method: PaymentMethod::Cash,
                delivery_address: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(order.order_type, OrderType::DineIn);
        assert_eq!(order.table_number.as_deref(), Some("7"));
        assert_eq!(order.customer_name.as_deref(), Some("Priya"));
        // Stored under the table's scope
        let key = order.order_number.as_deref().unwrap();
        assert!(cache.find_order("table_7", key).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_signed_in_user_id_is_attached() {
        let remote = MockOrders::new();
        let cache = OrderCache::open_in_memory().unwrap();
        cache
            .set_session(&Session {
                token: "jwt".to_string(),
                user: UserInfo {
                    id: "64b1f0c2a9d3e45f6a7b8c00".to_string(),
                    name: "Asha".to_string(),
                    email: None,
                },
            })
            .unwrap();
        Cart::new(cache.clone()).add(line("m1", 120.0, 1)).unwrap();

        let checkout = Checkout::new(remote, cache);
        let order = checkout.place_order(delivery_request()).await.unwrap();
        assert_eq!(order.user_id.as_deref(), Some("64b1f0c2a9d3e45f6a7b8c00"));
        assert_eq!(order.customer_name.as_deref(), Some("Asha"));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let checkout = Checkout::new(MockOrders::new(), OrderCache::open_in_memory().unwrap());
        let result = checkout.place_order(delivery_request()).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delivery_without_address_is_rejected() {
        let cache = OrderCache::open_in_memory().unwrap();
        Cart::new(cache.clone()).add(line("m1", 120.0, 1)).unwrap();
        let checkout = Checkout::new(MockOrders::new(), cache);

        let result = checkout
            .place_order(CheckoutRequest {
                payment_method: PaymentMethod::Cash,
                delivery_address: None,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_guest_order_kept_locally_when_unauthorized() {
        let remote = MockOrders::new();
        remote.deny_unauthorized();
        let cache = OrderCache::open_in_memory().unwrap();
        let cart = Cart::new(cache.clone());
        cart.add(line("m1", 120.0, 1)).unwrap();

        let checkout = Checkout::new(remote, cache.clone());
        let order = checkout.place_order(delivery_request()).await.unwrap();

        assert!(order.id.is_none());
        let key = order.order_number.as_deref().unwrap();
        assert!(cache.find_order("default", key).unwrap().is_some());
        assert!(cart.items().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_the_cart() {
        let remote = MockOrders::new();
        remote.deny_internal();
        let cache = OrderCache::open_in_memory().unwrap();
        let cart = Cart::new(cache.clone());
        cart.add(line("m1", 120.0, 1)).unwrap();

        let checkout = Checkout::new(remote, cache.clone());
        let result = checkout.place_order(delivery_request()).await;

        assert!(matches!(result, Err(ClientError::Internal(_))));
        assert_eq!(cart.items().unwrap().len(), 1);
        assert!(cache.orders("default").unwrap().is_empty());
    }
}
