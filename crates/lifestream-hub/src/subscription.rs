//! Per-connection subscription lifecycle.
//!
//! [`run_subscription`] registers a viewport, hands the update stream to a
//! transport-specific forwarder, and then parks until the connection's
//! [`StopSignal`] fires. Removal from the hub and aborting the forwarder
//! are tied to a [`SubscriptionGuard`], so both happen on every exit path,
//! including the handler future being dropped mid-wait.

use std::future::Future;
use std::sync::Arc;

use lifestream_core::StopSignal;
use lifestream_types::{BoardUpdate, SubscriberId, Viewport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::hub::{HubError, Subscription, SubscriptionHub};

/// Removes its subscriber from the hub, and aborts the attached forwarder
/// task, when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    hub: Arc<SubscriptionHub>,
    id: SubscriberId,
    forwarder: Option<JoinHandle<()>>,
}

impl SubscriptionGuard {
    /// Guard an already-registered subscriber.
    pub const fn new(hub: Arc<SubscriptionHub>, id: SubscriberId) -> Self {
        Self {
            hub,
            id,
            forwarder: None,
        }
    }

    /// Tie a forwarding task to this guard; it is aborted on release.
    pub fn attach(&mut self, forwarder: JoinHandle<()>) {
        if let Some(previous) = self.forwarder.replace(forwarder) {
            previous.abort();
        }
    }

    /// The guarded handle.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        // Idempotent: the hub may already have dropped us after a failed
        // delivery.
        let removed = self.hub.unsubscribe(self.id);
        debug!(subscriber = %self.id, removed, "Subscription released");
    }
}

/// Serve one viewer until its connection is cancelled.
///
/// `forward` receives the viewport-filtered update stream and pushes each
/// update to the viewer. It runs as its own task; when it returns (the
/// transport failed, or the hub closed the stream) `cancel` is fired.
/// Once `cancel` fires, the forwarder is aborted and the subscriber
/// removed. No timeout applies to the wait.
///
/// Returns the handle that was used.
///
/// # Errors
///
/// Returns [`HubError::Viewport`] if the viewport does not fit the grid;
/// nothing is registered in that case.
pub async fn run_subscription<F, Fut>(
    hub: Arc<SubscriptionHub>,
    viewport: Viewport,
    cancel: StopSignal,
    forward: F,
) -> Result<SubscriberId, HubError>
where
    F: FnOnce(mpsc::Receiver<BoardUpdate>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let Subscription { id, updates, .. } = hub.subscribe(viewport, cancel.clone())?;
    let mut guard = SubscriptionGuard::new(Arc::clone(&hub), id);
    info!(subscriber = %id, %viewport, "Viewer subscribed");

    let forward = forward(updates);
    let forward_done = cancel.clone();
    guard.attach(tokio::spawn(async move {
        forward.await;
        forward_done.stop();
    }));

    cancel.stopped().await;
    drop(guard);
    info!(subscriber = %id, "Viewer unsubscribed");
    Ok(id)
}
