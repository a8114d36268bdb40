//! Cooperative cancellation

use tokio::sync::watch;

/// Flips the shared shutdown flag
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // Receivers may all be gone already, nothing to tell them then
        let _ = self.tx.send(true);
    }
}

/// Read side of the shutdown flag, checked by jobs between items
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // An error means the trigger was dropped, which also ends the wait
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// Create a linked trigger and flag
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}
