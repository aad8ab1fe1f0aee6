//! The document store collaborator contract.
//!
//! A backend exposes named collections supporting find/insert/update. The
//! shell only requires this capability set; the concrete driver is chosen
//! at wiring time (the in-tree [`crate::store::MemoryBackend`] or an
//! external driver adapter).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Typed store error. Operations return these as values; nothing in the
/// store layer panics on failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection not established")]
    NotConnected,

    #[error("store did not become ready after {attempts} attempts")]
    ConnectTimeout { attempts: u32 },

    #[error("invalid document identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Options for find operations.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of leading matches to skip.
    pub skip: usize,
}

/// Options for update operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Update every match instead of the first one.
    pub many: bool,
}

/// Outcome of an update operation.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

/// Asynchronous document store driver.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Attempt to reach the store. Called repeatedly by the connection
    /// manager until it succeeds or the attempt budget runs out.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Find the first document matching `filter`, or None.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Value,
        options: &FindOptions,
    ) -> Result<Option<Value>, StoreError>;

    /// Find all documents matching `filter`, fully materialized, in
    /// insertion order.
    async fn find(
        &self,
        collection: &str,
        filter: &Value,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    /// Insert documents. Atomicity is whatever the store gives per call;
    /// no per-document rollback.
    async fn insert(&self, collection: &str, docs: Vec<Value>) -> Result<(), StoreError>;

    /// Apply `patch` to matching documents.
    async fn update(
        &self,
        collection: &str,
        filter: &Value,
        patch: &Value,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, StoreError>;

    /// Release the underlying connection. Default: nothing to release.
    async fn close(&self) {}
}
