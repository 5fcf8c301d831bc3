//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcast coordinator that every long-running task subscribes to.
///
/// The HTTP server stops accepting and drains in-flight requests once the
/// signal fires; the CLI triggers it from [`super::signals::wait_for_signal`].
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. A no-op when nobody is listening.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no subscribers");
        }
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `rx` observes shutdown or its sender is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    // Lagged means a signal was sent; Closed means the coordinator was dropped.
    let _ = rx.recv().await;
}
