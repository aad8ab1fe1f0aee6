//! Connection lifecycle management.
//!
//! # States
//! - Unconnected: no attempt made yet
//! - Connecting: polling the backend
//! - Ready: backend confirmed reachable; all handles adopt it
//!
//! # State Transitions
//! ```text
//! Unconnected → Connecting: first connect() call
//! Connecting  → Ready:      backend confirms a live connection
//! Ready       → Unconnected: only via explicit shutdown()
//! ```
//!
//! There is no automatic reconnect on drop. Polling is bounded: after
//! `max_connect_attempts` at `poll_interval_ms` cadence, connect() fails
//! with `StoreError::ConnectTimeout` instead of spinning forever.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::config::StoreConfig;
use crate::store::backend::{DocumentBackend, StoreError};
use crate::store::START_LOG_COLLECTION;

const UNCONNECTED: u8 = 0;
const CONNECTING: u8 = 1;
const READY: u8 = 2;

/// Connection lifecycle state, shared by every handle of one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Ready,
}

/// Owns the single shared connection to the document store.
///
/// Injected via `Arc` into every component that needs store access;
/// replaces process-global connection state so tests get clean teardown.
pub struct StoreManager {
    backend: Arc<dyn DocumentBackend>,
    state: AtomicU8,
    config: StoreConfig,
}

impl StoreManager {
    pub fn new(backend: Arc<dyn DocumentBackend>, config: StoreConfig) -> Self {
        Self {
            backend,
            state: AtomicU8::new(UNCONNECTED),
            config,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.state.load(Ordering::Acquire) {
            READY => ConnectionState::Ready,
            CONNECTING => ConnectionState::Connecting,
            _ => ConnectionState::Unconnected,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    pub(crate) fn backend(&self) -> &dyn DocumentBackend {
        self.backend.as_ref()
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Establish the shared connection. Idempotent: once `Ready`, later
    /// calls (and handles created later) adopt the live connection
    /// immediately instead of reconnecting.
    pub async fn connect(&self) -> Result<(), StoreError> {
        match self.state.compare_exchange(
            UNCONNECTED,
            CONNECTING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(READY) => return Ok(()),
            // Another task is already polling; wait alongside it.
            Err(_) => return self.wait_until_ready().await,
        }

        let store_url = self.config.connection_string();
        tracing::debug!(store = %store_url, "connecting to document store");

        let attempts = self.config.max_connect_attempts;
        for attempt in 1..=attempts {
            match self.backend.connect().await {
                Ok(()) => {
                    self.state.store(READY, Ordering::Release);
                    tracing::info!(attempt, "database connection established");
                    return Ok(());
                }
                Err(error) => {
                    tracing::debug!(attempt, error = %error, "store not ready yet");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.poll_interval()).await;
            }
        }

        self.state.store(UNCONNECTED, Ordering::Release);
        Err(StoreError::ConnectTimeout { attempts })
    }

    /// Poll until the manager reports `Ready`, within the same attempt
    /// budget as `connect()`.
    async fn wait_until_ready(&self) -> Result<(), StoreError> {
        let attempts = self.config.max_connect_attempts;
        for _ in 0..attempts {
            if self.is_ready() {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
        Err(StoreError::ConnectTimeout { attempts })
    }

    /// Resolve once the connection is `Ready` and a readiness probe (one
    /// lifecycle record written to the startup log collection) has been
    /// attempted. Returns `Ok(true)` on probe success, `Ok(false)` when
    /// the probe write fails; never resolves before `Ready`.
    pub async fn await_ready(&self) -> Result<bool, StoreError> {
        self.wait_until_ready().await?;

        let record = json!({ "UTC": Utc::now().to_rfc3339() });
        match self.backend.insert(START_LOG_COLLECTION, vec![record]).await {
            Ok(()) => Ok(true),
            Err(error) => {
                tracing::warn!(error = %error, "readiness probe write failed");
                Ok(false)
            }
        }
    }

    /// Tear the connection down. Subsequent operations fail with
    /// `NotConnected` until `connect()` is called again.
    pub async fn shutdown(&self) {
        self.backend.close().await;
        self.state.store(UNCONNECTED, Ordering::Release);
        tracing::info!("document store connection closed");
    }
}
