//! Per-view order tracking
//!
//! Composition root for one mounted tracking view: an initial load, the
//! fixed-interval poller, and (optionally) push-event-triggered re-fetches,
//! all writing to one `watch` state cell. Both producers replace the whole
//! value; the cell never sees a partial field merge.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use shared::message::OrderUpdatePayload;
use shared::models::order::{Order, OrderPatch, OrderStatus};

use crate::fetch::OrderFetcher;
use crate::notify::{Notifier, OrderNotification};
use crate::poll::StatusPoller;
use crate::repository::OrderRepository;
use crate::{ClientError, ClientResult};

/// Display state of a tracking view
#[derive(Debug, Clone, Default)]
pub enum TrackingState {
    #[default]
    Loading,
    Active(Order),
    /// Neither remote nor local lookup resolved the identifier
    NotFound,
}

impl TrackingState {
    pub fn order(&self) -> Option<&Order> {
        match self {
            TrackingState::Active(order) => Some(order),
            _ => None,
        }
    }
}

/// A live tracking session for a single order
pub struct OrderTracker {
    order_id: String,
    fetcher: Arc<OrderFetcher>,
    remote: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
    state_tx: watch::Sender<TrackingState>,
    poller: StatusPoller,
    events_token: CancellationToken,
}

impl OrderTracker {
    /// Load the order once, then start polling it
    pub async fn start(
        order_id: impl Into<String>,
        remote: Arc<dyn OrderRepository>,
        local: Arc<dyn OrderRepository>,
        poll_interval: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let order_id = order_id.into();
        let fetcher = Arc::new(OrderFetcher::new(remote.clone(), local));
        let (state_tx, _) = watch::channel(TrackingState::Loading);

        refresh_into(&fetcher, &order_id, &state_tx, true).await;

        let poller = StatusPoller::spawn(
            fetcher.clone(),
            order_id.clone(),
            poll_interval,
            state_tx.clone(),
        );

        Self {
            order_id,
            fetcher,
            remote,
            notifier,
            state_tx,
            poller,
            events_token: CancellationToken::new(),
        }
    }

    /// Subscribe to display-state changes
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current display state
    pub fn current(&self) -> TrackingState {
        self.state_tx.borrow().clone()
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Re-fetch now and replace the display state
    pub async fn refresh(&self) {
        refresh_into(&self.fetcher, &self.order_id, &self.state_tx, false).await;
    }

    /// Follow push events: an update for the tracked order triggers a
    /// pull-based re-fetch; the pushed fields themselves are never displayed.
    pub fn watch_events(&self, mut events: broadcast::Receiver<OrderUpdatePayload>) {
        let token = self.events_token.child_token();
        let fetcher = self.fetcher.clone();
        let order_id = self.order_id.clone();
        let state_tx = self.state_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(payload) => {
                            let concerns_this_order = payload
                                .order
                                .as_ref()
                                .is_some_and(|order| order.matches_id(&order_id));
                            if concerns_this_order {
                                refresh_into(&fetcher, &order_id, &state_tx, false).await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "event stream lagged, continuing");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    /// Customer-initiated cancellation
    ///
    /// Available only while the status is `pending` or `confirmed`. The
    /// update is not applied locally until the server confirms it; on
    /// rejection the server's message is surfaced and displayed state is
    /// left untouched.
    pub async fn cancel_order(&self) -> ClientResult<Order> {
        let current = match self.current() {
            TrackingState::Active(order) => order,
            _ => {
                return Err(ClientError::Validation(
                    "No order available to cancel".to_string(),
                ));
            }
        };
        if !current.status.can_cancel() {
            return Err(ClientError::Validation(
                "Order can no longer be cancelled".to_string(),
            ));
        }

        let id = current
            .key()
            .map(str::to_string)
            .unwrap_or_else(|| self.order_id.clone());
        match self
            .remote
            .update(&id, &OrderPatch::status(OrderStatus::Cancelled))
            .await
        {
            Ok(updated) => {
                self.notifier.notify(&OrderNotification::cancelled(&updated));
                self.refresh().await;
                Ok(updated)
            }
            Err(err) => {
                self.notifier
                    .notify(&OrderNotification::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Tear down the view: stops the poller and the event follower
    pub fn shutdown(&self) {
        self.poller.shutdown();
        self.events_token.cancel();
    }
}

impl Drop for OrderTracker {
    fn drop(&mut self) {
        self.events_token.cancel();
    }
}

/// Fetch and replace the state cell. Errors keep the last-known state,
/// except on the initial load where they land the terminal not-found view.
async fn refresh_into(
    fetcher: &Arc<OrderFetcher>,
    order_id: &str,
    state_tx: &watch::Sender<TrackingState>,
    initial: bool,
) {
    match fetcher.fetch(order_id).await {
        Ok(fetched) => {
            state_tx.send_replace(TrackingState::Active(fetched.order));
        }
        Err(err) => {
            tracing::debug!(order_id = %order_id, error = %err, "order fetch failed");
            if initial {
                state_tx.send_replace(TrackingState::NotFound);
            }
        }
    }
}
