//! The uniform CRUD contract handlers program against.
//!
//! A `StoreHandle` is a cheap clone over the shared [`StoreManager`].
//! Every operation resolves to a typed `Result` value so controllers can
//! branch on the error uniformly; nothing here panics on failure.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::store::backend::{FindOptions, StoreError, UpdateOptions, UpdateReport};
use crate::store::connection::StoreManager;

/// One document or an ordered batch, for [`StoreHandle::insert`].
pub enum DocumentSet {
    One(Value),
    Many(Vec<Value>),
}

impl From<Value> for DocumentSet {
    fn from(doc: Value) -> Self {
        DocumentSet::One(doc)
    }
}

impl From<Vec<Value>> for DocumentSet {
    fn from(docs: Vec<Value>) -> Self {
        DocumentSet::Many(docs)
    }
}

impl DocumentSet {
    fn into_vec(self) -> Vec<Value> {
        match self {
            DocumentSet::One(doc) => vec![doc],
            DocumentSet::Many(docs) => docs,
        }
    }
}

/// Stamp a document with a `_createTime` timestamp iff it does not already
/// carry one. Idempotent: an already-stamped document passes through
/// untouched, keeping its original timestamp.
pub fn stamp_document(mut doc: Value) -> Value {
    if let Some(object) = doc.as_object_mut() {
        if !object.contains_key("_createTime") {
            object.insert(
                "_createTime".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
    }
    doc
}

/// Handle to the shared document store connection.
#[derive(Clone)]
pub struct StoreHandle {
    manager: Arc<StoreManager>,
}

impl StoreHandle {
    pub fn new(manager: Arc<StoreManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &StoreManager {
        &self.manager
    }

    fn ready(&self) -> Result<(), StoreError> {
        if self.manager.is_ready() {
            Ok(())
        } else {
            Err(StoreError::NotConnected)
        }
    }

    /// Find the first document of `collection` matching `filter`.
    pub async fn find_one(
        &self,
        collection: &str,
        filter: Value,
        options: FindOptions,
    ) -> Result<Option<Value>, StoreError> {
        self.ready()?;
        self.manager
            .backend()
            .find_one(collection, &filter, &options)
            .await
    }

    /// Find every matching document, fully materialized in insertion
    /// order (no cursor streaming).
    pub async fn find(
        &self,
        collection: &str,
        filter: Value,
        options: FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        self.ready()?;
        self.manager
            .backend()
            .find(collection, &filter, &options)
            .await
    }

    /// Insert one document or an ordered batch; each document is stamped
    /// with `_createTime` before insertion.
    pub async fn insert(
        &self,
        collection: &str,
        docs: impl Into<DocumentSet>,
    ) -> Result<(), StoreError> {
        self.ready()?;
        let stamped = docs
            .into()
            .into_vec()
            .into_iter()
            .map(stamp_document)
            .collect();
        self.manager.backend().insert(collection, stamped).await
    }

    /// Apply `patch` to documents matching `filter`.
    pub async fn update(
        &self,
        collection: &str,
        filter: Value,
        patch: Value,
        options: UpdateOptions,
    ) -> Result<UpdateReport, StoreError> {
        self.ready()?;
        self.manager
            .backend()
            .update(collection, &filter, &patch, &options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::memory::MemoryBackend;
    use serde_json::json;

    async fn connected_handle() -> StoreHandle {
        let manager = Arc::new(StoreManager::new(
            Arc::new(MemoryBackend::new()),
            StoreConfig {
                poll_interval_ms: 5,
                max_connect_attempts: 3,
                ..StoreConfig::default()
            },
        ));
        manager.connect().await.unwrap();
        StoreHandle::new(manager)
    }

    #[test]
    fn stamping_adds_create_time_once() {
        let stamped = stamp_document(json!({"name": "ada"}));
        let first_time = stamped["_createTime"].as_str().unwrap().to_string();

        let restamped = stamp_document(stamped.clone());
        assert_eq!(restamped, stamped);
        assert_eq!(restamped["_createTime"], first_time.as_str());
    }

    #[test]
    fn stamping_respects_existing_timestamps() {
        let doc = json!({"_createTime": "2020-01-01T00:00:00Z", "x": 1});
        assert_eq!(stamp_document(doc.clone()), doc);
    }

    #[tokio::test]
    async fn operations_before_connect_fail_not_connected() {
        let manager = Arc::new(StoreManager::new(
            Arc::new(MemoryBackend::new()),
            StoreConfig::default(),
        ));
        let handle = StoreHandle::new(manager);
        let err = handle
            .find_one("users", json!({}), FindOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConnected));
    }

    #[tokio::test]
    async fn insert_stamps_every_document() {
        let handle = connected_handle().await;
        handle
            .insert("batch", vec![json!({"n": 1}), json!({"n": 2})])
            .await
            .unwrap();

        let docs = handle
            .find("batch", json!({}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        for doc in docs {
            assert!(doc["_createTime"].is_string());
        }
    }

    #[tokio::test]
    async fn concurrent_inserts_stamp_their_own_documents() {
        let handle = connected_handle().await;
        let mut tasks = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .insert("concurrent", serde_json::json!({"task": i}))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let docs = handle
            .find("concurrent", json!({}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 8);
        for doc in docs {
            assert!(doc["_createTime"].is_string());
            assert!(doc["task"].is_number());
        }
    }

    #[tokio::test]
    async fn update_round_trips_through_the_handle() {
        let handle = connected_handle().await;
        handle
            .insert("users", json!({"name": "ada", "role": "user"}))
            .await
            .unwrap();
        let report = handle
            .update(
                "users",
                json!({"name": "ada"}),
                json!({"$set": {"role": "admin"}}),
                UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(report.matched, 1);

        let doc = handle
            .find_one("users", json!({"name": "ada"}), FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["role"], "admin");
    }
}
