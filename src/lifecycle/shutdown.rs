//! Graceful stop of the proxy listener.
//!
//! `HttpServer::run` stops accepting connections once `shutdown_signal`
//! resolves; requests already being forwarded are allowed to finish.

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_signal;

/// Handle that stops every server subscribed to it.
///
/// Dropping the handle stops them too, so embedders and tests hold it for
/// as long as the proxy should keep serving.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop all subscribed servers. A no-op once they are gone.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Servers still listening for the stop.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on an OS stop signal or a trigger on `rx`, whichever comes first.
///
/// A closed channel counts as a trigger.
pub async fn shutdown_signal(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = wait_for_signal() => {}
        _ = rx.recv() => tracing::info!("Shutdown triggered"),
    }
}
