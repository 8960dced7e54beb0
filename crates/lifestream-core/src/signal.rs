//! Cooperative, single-shot stop signal.
//!
//! [`StopSignal`] is shared between a long-lived task and whoever decides
//! that task should end. It doubles as the per-connection cancellation
//! signal (fired when the viewer's transport goes away) and as the
//! shutdown signal for the evolution and broadcast drivers.
//!
//! The signal is level-triggered: once stopped it stays stopped, and
//! [`StopSignal::stopped`] returns immediately for late waiters.

use std::sync::Arc;

use tokio::sync::watch;

/// Clonable stop flag. All clones observe the same state.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Create a signal in the running (not stopped) state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the signal has fired.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires.
    ///
    /// Returns immediately if it already has. There is no timeout.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close
        // while we wait.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn stop_wakes_waiter() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };
        assert!(!signal.is_stopped());
        signal.stop();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn late_waiter_returns_immediately() {
        let signal = StopSignal::new();
        signal.stop();
        signal.stop();
        assert!(signal.is_stopped());
        let waited = tokio::time::timeout(Duration::from_millis(50), signal.stopped()).await;
        assert!(waited.is_ok());
    }
}
