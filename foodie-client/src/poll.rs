//! Fixed-interval status polling
//!
//! One polling task per mounted tracking view, re-issuing the point lookup
//! every interval and replacing the view's state cell wholesale with each
//! response ("last response received wins"). The task is cancelled on view
//! teardown; a leaked timer would keep writing stale state to an unmounted
//! view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::fetch::OrderFetcher;
use crate::tracker::TrackingState;

/// Handle to a spawned polling loop
pub struct StatusPoller {
    token: CancellationToken,
}

impl StatusPoller {
    /// Spawn the polling loop for one tracking view
    ///
    /// Ticks are suppressed while the fetcher is pinned to the local
    /// fallback source; a failed tick is logged and swallowed, keeping the
    /// last-known-good state on display.
    pub fn spawn(
        fetcher: Arc<OrderFetcher>,
        order_id: String,
        interval: Duration,
        state: watch::Sender<TrackingState>,
    ) -> Self {
        let token = CancellationToken::new();
        let child = token.child_token();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if fetcher.is_pinned_local() {
                            continue;
                        }
                        match fetcher.fetch(&order_id).await {
                            Ok(fetched) => {
                                state.send_replace(TrackingState::Active(fetched.order));
                            }
                            Err(err) => {
                                tracing::debug!(
                                    order_id = %order_id,
                                    error = %err,
                                    "poll tick failed, keeping last known state"
                                );
                            }
                        }
                    }
                }
            }
        });

        Self { token }
    }

    /// Cancel the polling loop
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
