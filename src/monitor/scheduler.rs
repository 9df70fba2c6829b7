//! Periodic scheduling of monitoring batches.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::dispatcher::LinkDispatcher;
use crate::link::{LinkError, LinkStore};

/// Drives the monitoring loop: startup recovery, then one dispatcher run
/// per interval tick.
///
/// The dispatcher run is awaited inline, so batches can never overlap, and
/// ticks missed while a long batch runs are skipped rather than bunched.
pub struct MonitorScheduler {
    store: LinkStore,
    dispatcher: Arc<LinkDispatcher>,
    interval_minutes: u64,
}

impl MonitorScheduler {
    /// Creates a scheduler ticking every `interval_minutes`.
    #[must_use]
    pub fn new(store: LinkStore, dispatcher: Arc<LinkDispatcher>, interval_minutes: u64) -> Self {
        Self {
            store,
            dispatcher,
            interval_minutes,
        }
    }

    /// Resets links stranded in an in-flight status by a previous session.
    ///
    /// Call once before [`run`](Self::run): any link still marked
    /// monitoring, downloading, or recording at startup has no live
    /// processor behind it.
    ///
    /// # Returns
    ///
    /// The number of links reset.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the reset update fails.
    #[instrument(skip(self))]
    pub async fn startup_reset(&self) -> Result<u64, LinkError> {
        let reset = self.store.reset_stale().await?;
        if reset > 0 {
            warn!(count = reset, "reset stale in-flight links from previous session");
        } else {
            debug!("no stale in-flight links found");
        }
        Ok(reset)
    }

    /// Runs the monitoring loop forever.
    ///
    /// The first batch fires after one full interval, not immediately;
    /// operators use the manual trigger when they cannot wait. Batch
    /// errors are logged and the loop continues.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.interval_minutes * 60);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_minutes = self.interval_minutes,
            "monitoring scheduler started"
        );

        loop {
            ticker.tick().await;
            match self.dispatcher.run().await {
                Ok(dispatched) => debug!(dispatched, "scheduled batch complete"),
                Err(batch_error) => {
                    error!(error = %batch_error, "scheduled batch failed");
                }
            }
        }
    }
}
