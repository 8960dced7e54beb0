//! Subscription hub: the registry of viewport subscribers and the
//! fan-out broadcast over it.
//!
//! # Locking
//!
//! The registry sits behind its own [`RwLock`], independent of the board.
//! [`SubscriptionHub::broadcast`] copies the registry under a short read
//! lock and releases it before any delivery, so subscriber I/O never blocks
//! `subscribe`/`unsubscribe` and a concurrent mutation is never observed
//! mid-pass.
//!
//! # Delivery
//!
//! Each subscriber owns a bounded queue. A delivery is an async send into
//! that queue, optionally bounded by a timeout. A closed queue, a timed-out
//! send, or an already-fired cancellation signal marks the subscriber for
//! removal once the whole pass is done; one bad subscriber never interrupts
//! delivery to the others.
//!
//! Every entry remembers the last generation it was sent. A pass skips
//! subscribers that already have the generation being broadcast, so
//! repeated passes over an unchanged board never resend it, while a
//! subscriber that joined late still gets the current board.

use std::collections::BTreeMap;
use std::time::Duration;

use lifestream_core::config::HubConfig;
use lifestream_core::{Generation, StopSignal};
use lifestream_types::{BoardUpdate, GridError, GridSize, SubscriberId, Viewport};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// Errors returned by the hub to subscribing callers.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The requested viewport does not fit the grid.
    #[error("viewport rejected: {source}")]
    Viewport {
        /// The underlying geometry error.
        #[from]
        source: GridError,
    },
}

/// Registry entry. Cloned into the per-pass snapshot.
#[derive(Debug, Clone)]
struct Subscriber {
    viewport: Viewport,
    cancel: StopSignal,
    tx: mpsc::Sender<BoardUpdate>,
    last_delivered: Option<u64>,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    AlreadyCurrent,
    Cancelled,
    Closed,
    TimedOut,
}

/// A live registration returned by [`SubscriptionHub::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    /// The opaque handle to pass back to [`SubscriptionHub::unsubscribe`].
    pub id: SubscriberId,
    /// The accepted viewport.
    pub viewport: Viewport,
    /// Updates filtered to the viewport, in delivery order.
    pub updates: mpsc::Receiver<BoardUpdate>,
}

/// Summary of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Generation that was broadcast.
    pub generation: u64,
    /// Subscribers in the snapshot taken at the start of the pass.
    pub targets: usize,
    /// Successful deliveries.
    pub delivered: usize,
    /// Subscribers that already had this generation.
    pub skipped: usize,
    /// Subscribers removed after the pass.
    pub removed: usize,
}

/// Registry of viewport subscribers with a fan-out broadcast.
#[derive(Debug)]
pub struct SubscriptionHub {
    size: GridSize,
    delivery_timeout: Option<Duration>,
    channel_capacity: usize,
    registry: RwLock<BTreeMap<SubscriberId, Subscriber>>,
}

impl SubscriptionHub {
    /// Create an empty hub for a grid of the given size.
    pub fn new(size: GridSize, config: &HubConfig) -> Self {
        Self {
            size,
            delivery_timeout: config.delivery_timeout(),
            channel_capacity: config.channel_capacity.max(1),
            registry: RwLock::new(BTreeMap::new()),
        }
    }

    /// The grid the hub validates viewports against.
    pub const fn grid_size(&self) -> GridSize {
        self.size
    }

    /// Validate a viewport without registering it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Viewport`] if the viewport is empty or reaches
    /// outside the grid.
    pub fn check_viewport(&self, viewport: Viewport) -> Result<Viewport, HubError> {
        Ok(self.size.check_viewport(viewport)?)
    }

    /// Register a viewport and return its handle and update stream.
    ///
    /// `cancel` is the owning connection's cancellation signal; once it
    /// fires the subscriber is dropped at the next broadcast pass.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Viewport`] if the viewport does not fit the grid.
    /// Out-of-range viewports are rejected, never clamped.
    pub fn subscribe(
        &self,
        viewport: Viewport,
        cancel: StopSignal,
    ) -> Result<Subscription, HubError> {
        let viewport = self.check_viewport(viewport)?;
        let (tx, updates) = mpsc::channel(self.channel_capacity);
        let id = SubscriberId::new();
        self.registry.write().insert(
            id,
            Subscriber {
                viewport,
                cancel,
                tx,
                last_delivered: None,
            },
        );
        Ok(Subscription {
            id,
            viewport,
            updates,
        })
    }

    /// Remove a subscriber. Returns whether it was present.
    ///
    /// Idempotent: removing an absent handle is a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.registry.write().remove(&id).is_some()
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.registry.read().contains_key(&id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }

    /// Fire every subscriber's cancellation signal and clear the registry.
    ///
    /// Used at shutdown; no final message is sent. Returns how many
    /// subscribers were dropped.
    pub fn close_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.registry.write());
        for subscriber in drained.values() {
            subscriber.cancel.stop();
        }
        drained.len()
    }

    /// Deliver `generation` to every subscriber, clipped to its viewport.
    ///
    /// Subscribers that were already sent this generation are skipped.
    /// Subscribers whose delivery failed are removed after the pass.
    pub async fn broadcast(&self, generation: &Generation) -> BroadcastReport {
        let targets: Vec<(SubscriberId, Subscriber)> = self
            .registry
            .read()
            .iter()
            .map(|(id, subscriber)| (*id, subscriber.clone()))
            .collect();

        let mut report = BroadcastReport {
            generation: generation.number(),
            targets: targets.len(),
            ..BroadcastReport::default()
        };
        let mut delivered = Vec::new();
        let mut stale = Vec::new();

        for (id, subscriber) in &targets {
            match self.deliver(generation, subscriber).await {
                Delivery::Delivered => delivered.push(*id),
                Delivery::AlreadyCurrent => report.skipped = report.skipped.saturating_add(1),
                outcome => {
                    debug!(subscriber = %id, ?outcome, "Delivery failed, dropping subscriber");
                    stale.push(*id);
                }
            }
        }
        report.delivered = delivered.len();

        // Handles may have left through their own unsubscribe during the
        // pass; only touch and count entries that are still registered.
        let mut registry = self.registry.write();
        for id in &delivered {
            if let Some(entry) = registry.get_mut(id) {
                entry.last_delivered = Some(report.generation);
            }
        }
        report.removed = stale
            .iter()
            .filter(|id| registry.remove(*id).is_some())
            .count();
        drop(registry);
        report
    }

    async fn deliver(&self, generation: &Generation, subscriber: &Subscriber) -> Delivery {
        if subscriber.cancel.is_stopped() {
            return Delivery::Cancelled;
        }
        if subscriber
            .last_delivered
            .is_some_and(|last| last >= generation.number())
        {
            return Delivery::AlreadyCurrent;
        }
        let update = BoardUpdate {
            generation: generation.number(),
            alive_cells: generation.project(&subscriber.viewport),
            sent_timestamp_nanos: now_nanos(),
        };
        let send = subscriber.tx.send(update);
        let sent = match self.delivery_timeout {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(sent) => sent,
                Err(_elapsed) => return Delivery::TimedOut,
            },
            None => send.await,
        };
        if sent.is_ok() {
            Delivery::Delivered
        } else {
            Delivery::Closed
        }
    }
}

/// Wall-clock time as Unix epoch nanoseconds.
pub fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use lifestream_core::Automaton;
    use lifestream_types::Cell;

    use super::*;

    fn hub_with(width: i32, height: i32, timeout_ms: u64, capacity: usize) -> SubscriptionHub {
        SubscriptionHub::new(
            GridSize::new(width, height).unwrap(),
            &HubConfig {
                delivery_timeout_ms: timeout_ms,
                channel_capacity: capacity,
            },
        )
    }

    fn generation(width: i32, height: i32, coords: &[(i32, i32)]) -> Generation {
        Automaton::new(GridSize::new(width, height).unwrap())
            .genesis(coords.iter().copied().map(Cell::from))
            .unwrap()
    }

    #[tokio::test]
    async fn viewports_are_isolated() {
        let hub = hub_with(10, 10, 100, 4);
        let mut a = hub
            .subscribe(Viewport::new(0, 0, 5, 5), StopSignal::new())
            .unwrap();
        let mut b = hub
            .subscribe(Viewport::new(5, 5, 5, 5), StopSignal::new())
            .unwrap();

        let report = hub.broadcast(&generation(10, 10, &[(2, 2), (7, 7)])).await;
        assert_eq!(report.targets, 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, 0);

        let from_a = a.updates.recv().await.unwrap();
        let from_b = b.updates.recv().await.unwrap();
        assert_eq!(from_a.alive_cells, vec![Cell::new(2, 2)]);
        assert_eq!(from_b.alive_cells, vec![Cell::new(2, 2)]);
        assert_eq!(from_a.generation, 0);
        assert!(from_a.sent_timestamp_nanos > 0);
    }

    #[tokio::test]
    async fn empty_viewport_window_still_gets_updates() {
        let hub = hub_with(10, 10, 100, 4);
        let mut sub = hub
            .subscribe(Viewport::new(0, 0, 2, 2), StopSignal::new())
            .unwrap();
        hub.broadcast(&generation(10, 10, &[(8, 8)])).await;
        let update = sub.updates.recv().await.unwrap();
        assert!(update.alive_cells.is_empty());
    }

    #[test]
    fn rejects_viewport_outside_grid() {
        let hub = hub_with(10, 10, 100, 4);
        let rejected = hub.subscribe(Viewport::new(6, 0, 5, 5), StopSignal::new());
        assert!(matches!(rejected, Err(HubError::Viewport { .. })));
        assert!(hub.is_empty());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let hub = hub_with(10, 10, 100, 4);
        let keep = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();
        let gone = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();

        assert!(hub.unsubscribe(gone.id));
        assert!(!hub.unsubscribe(gone.id));
        assert_eq!(hub.len(), 1);
        assert!(hub.contains(keep.id));
    }

    #[tokio::test]
    async fn closed_connection_is_removed_after_pass() {
        let hub = hub_with(10, 10, 100, 4);
        let dead = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();
        let mut alive = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();
        let dead_id = dead.id;
        drop(dead.updates);

        let report = hub.broadcast(&generation(10, 10, &[(1, 1)])).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert!(!hub.contains(dead_id));
        assert!(alive.updates.recv().await.is_some());

        // Double removal after the hub's own cleanup is a no-op.
        assert!(!hub.unsubscribe(dead_id));
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_subscriber_is_skipped_and_removed() {
        let hub = hub_with(10, 10, 100, 4);
        let cancel = StopSignal::new();
        let mut sub = hub.subscribe(Viewport::new(0, 0, 10, 10), cancel.clone()).unwrap();
        cancel.stop();

        let report = hub.broadcast(&generation(10, 10, &[(1, 1)])).await;
        assert_eq!(report.delivered, 0);
        assert_eq!(report.removed, 1);
        // The registry held the only sender, so the stream is now closed.
        assert!(sub.updates.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_consumer_times_out_without_blocking_others() {
        let hub = hub_with(10, 10, 20, 1);
        let stalled = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();
        let mut healthy = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();

        let g0 = generation(10, 10, &[(0, 1), (1, 1), (2, 1)]);
        let first = hub.broadcast(&g0).await;
        assert_eq!(first.delivered, 2);
        assert!(healthy.updates.recv().await.is_some());

        // The stalled queue is full; the healthy one was drained.
        let g1 = Automaton::new(GridSize::new(10, 10).unwrap()).step(&g0);
        let second = hub.broadcast(&g1).await;
        assert_eq!(second.delivered, 1);
        assert_eq!(second.removed, 1);
        assert!(!hub.contains(stalled.id));
        assert!(healthy.updates.recv().await.is_some());
    }

    #[tokio::test]
    async fn unchanged_generation_reaches_only_late_joiners() {
        let hub = hub_with(10, 10, 100, 4);
        let g0 = generation(10, 10, &[(4, 4)]);
        let mut early = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();

        let first = hub.broadcast(&g0).await;
        assert_eq!((first.delivered, first.skipped), (1, 0));
        assert_eq!(early.updates.recv().await.unwrap().generation, 0);

        let mut late = hub
            .subscribe(Viewport::new(0, 0, 10, 10), StopSignal::new())
            .unwrap();
        let second = hub.broadcast(&g0).await;
        assert_eq!(second.targets, 2);
        assert_eq!((second.delivered, second.skipped), (1, 1));
        assert_eq!(late.updates.recv().await.unwrap().generation, 0);
        assert!(early.updates.try_recv().is_err());

        // Nobody is resent a generation they already have.
        let third = hub.broadcast(&g0).await;
        assert_eq!((third.delivered, third.skipped), (0, 2));
        assert_eq!(hub.len(), 2);
    }

    #[tokio::test]
    async fn close_all_cancels_everyone() {
        let hub = hub_with(10, 10, 100, 4);
        let signals: Vec<StopSignal> = (0..3).map(|_| StopSignal::new()).collect();
        for signal in &signals {
            hub.subscribe(Viewport::new(0, 0, 10, 10), signal.clone())
                .unwrap();
        }
        assert_eq!(hub.close_all(), 3);
        assert!(hub.is_empty());
        assert!(signals.iter().all(StopSignal::is_stopped));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn broadcast_tolerates_concurrent_mutation() {
        let hub = Arc::new(hub_with(20, 20, 0, 64));
        let automaton = Automaton::new(GridSize::new(20, 20).unwrap());
        let mut current = automaton
            .genesis([Cell::new(1, 0), Cell::new(2, 1), Cell::new(0, 2), Cell::new(1, 2), Cell::new(2, 2)])
            .unwrap();

        // Each churner subscribes, reads whatever arrives, then leaves.
        let churners: Vec<_> = (0..8)
            .map(|_| {
                let hub = Arc::clone(&hub);
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    for _ in 0..20 {
                        let mut sub = hub
                            .subscribe(Viewport::new(0, 0, 20, 20), StopSignal::new())
                            .unwrap();
                        tokio::task::yield_now().await;
                        while let Ok(update) = sub.updates.try_recv() {
                            seen.push(update.generation);
                        }
                        hub.unsubscribe(sub.id);
                        while let Some(update) = sub.updates.recv().await {
                            seen.push(update.generation);
                        }
                        // Strictly increasing within one subscription: no
                        // duplicate or reordered delivery.
                        let strictly_increasing = seen.windows(2).all(|w| w[0] < w[1]);
                        assert!(strictly_increasing, "bad delivery order: {seen:?}");
                        seen.clear();
                    }
                })
            })
            .collect();

        for _ in 0..200 {
            hub.broadcast(&current).await;
            current = automaton.step(&current);
            tokio::task::yield_now().await;
        }
        for churner in churners {
            churner.await.unwrap();
        }
        assert!(hub.is_empty());

        // The alive set itself was never disturbed by the churn.
        let cells: BTreeSet<_> = current.alive().iter().copied().collect();
        assert_eq!(cells.len(), 5);
    }
}
