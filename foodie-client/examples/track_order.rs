//! Track a single order from the command line.
//!
//! ```sh
//! cargo run --example track_order -- <order-id> [base-url]
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use foodie_client::{
    ClientConfig, LocalOrders, LogNotifier, OrderCache, OrderStatus, OrderTracker, RemoteOrders,
    TimelineView, TrackingState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let order_id = args
        .next()
        .context("usage: track_order <order-id> [base-url]")?;
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let config = ClientConfig::new(base_url);
    let cache = OrderCache::open_in_memory()?;
    let remote = Arc::new(RemoteOrders::new(config.build_http_client()));
    let local = Arc::new(LocalOrders::new(cache));

    let tracker = OrderTracker::start(
        order_id.as_str(),
        remote,
        local,
        config.poll_interval,
        Arc::new(LogNotifier),
    )
    .await;

    let mut state = tracker.subscribe();
    loop {
        let current = state.borrow_and_update().clone();
        match current {
            TrackingState::Loading => println!("loading..."),
            TrackingState::NotFound => {
                println!("Order not found");
                break;
            }
            TrackingState::Active(order) => {
                match order.timeline_view() {
                    TimelineView::Cancelled => {
                        match order.cancellation_reason.as_deref() {
                            Some(reason) => println!("Order cancelled: {}", reason),
                            None => println!("Order cancelled"),
                        }
                        break;
                    }
                    TimelineView::Step(step) => println!(
                        "{} (step {}/{})",
                        order.status,
                        step + 1,
                        OrderStatus::TIMELINE.len()
                    ),
                }
                if order.status.is_terminal() {
                    break;
                }
            }
        }
        if state.changed().await.is_err() {
            break;
        }
    }

    tracker.shutdown();
    Ok(())
}
