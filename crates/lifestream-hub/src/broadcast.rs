//! Broadcast driver: periodically pushes the current generation to every
//! subscriber.
//!
//! The driver never touches the automaton. Each tick it reads the board
//! through a [`BoardReader`] and runs [`SubscriptionHub::broadcast`], which
//! skips subscribers that already have that generation. A pass that
//! outlasts the interval delays the next tick rather than overlapping it.

use std::sync::Arc;
use std::time::Duration;

use lifestream_core::{BoardReader, StopSignal};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::hub::{BroadcastReport, SubscriptionHub};

/// Shortest accepted broadcast period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic broadcaster over a shared hub.
#[derive(Debug)]
pub struct BroadcastDriver {
    hub: Arc<SubscriptionHub>,
    board: BoardReader,
    interval: Duration,
}

impl BroadcastDriver {
    /// Create a driver that broadcasts every `interval`.
    pub fn new(hub: Arc<SubscriptionHub>, board: BoardReader, interval: Duration) -> Self {
        Self {
            hub,
            board,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Broadcast the current generation once.
    pub async fn pass_once(&self) -> BroadcastReport {
        let current = self.board.current();
        self.hub.broadcast(&current).await
    }

    /// Run until `stop` fires. Returns the number of passes made.
    pub async fn run(self, stop: StopSignal) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "Broadcast driver starting");

        let mut passes: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = stop.stopped() => break,
                _ = ticker.tick() => {
                    let report = self.pass_once().await;
                    passes = passes.saturating_add(1);
                    if report.delivered > 0 || report.removed > 0 {
                        debug!(
                            generation = report.generation,
                            targets = report.targets,
                            delivered = report.delivered,
                            skipped = report.skipped,
                            removed = report.removed,
                            "Broadcast pass"
                        );
                    }
                }
            }
        }

        info!(passes, "Broadcast driver stopped");
        passes
    }
}
