//! Graceful shutdown signalling.
//!
//! One `Shutdown` per process. The HTTP server holds a receiver and
//! stops accepting once the signal fires; `main` then tears the store
//! connection down. `listen_for_ctrl_c` wires the interactive path.
//! Triggering with no subscribers, or more than once, is harmless.

use tokio::sync::broadcast;

pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fan the shutdown signal out to every current subscriber.
    pub fn trigger(&self) {
        let listeners = self.tx.receiver_count();
        tracing::info!(listeners, "shutdown triggered");
        let _ = self.tx.send(());
    }

    /// Spawn a task that triggers shutdown on Ctrl+C. Called once at
    /// boot; if the signal handler cannot be installed the server only
    /// stops via an explicit `trigger`.
    pub fn listen_for_ctrl_c(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("interrupt received");
                    let _ = tx.send(());
                }
                Err(error) => {
                    tracing::error!(error = %error, "failed to install interrupt handler");
                }
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
