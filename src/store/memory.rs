//! In-memory document backend.
//!
//! Collections are vectors of JSON objects behind a DashMap. Filters match
//! by top-level field equality, updates understand `$set` merges and
//! whole-document replacement. A configurable readiness delay lets tests
//! exercise the polling connection lifecycle against an eventually-ready
//! store.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::store::backend::{
    DocumentBackend, FindOptions, StoreError, UpdateOptions, UpdateReport,
};
use crate::store::id::DocumentId;

pub struct MemoryBackend {
    collections: DashMap<String, Vec<Value>>,
    created: Instant,
    ready_after: Duration,
}

impl MemoryBackend {
    /// A backend that is reachable immediately.
    pub fn new() -> Self {
        Self::ready_after(Duration::ZERO)
    }

    /// A backend that refuses connections for `delay` after creation.
    pub fn ready_after(delay: Duration) -> Self {
        Self {
            collections: DashMap::new(),
            created: Instant::now(),
            ready_after: delay,
        }
    }

    /// Number of documents currently held by `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// True iff every top-level field of `filter` equals the same field of `doc`.
/// An empty filter matches everything.
fn matches_filter(doc: &Value, filter: &Value) -> bool {
    match filter.as_object() {
        Some(conditions) => conditions
            .iter()
            .all(|(key, expected)| doc.get(key) == Some(expected)),
        None => true,
    }
}

/// Apply a patch to one document. `$set` merges the listed fields; any
/// other patch replaces the document wholesale, keeping only `_id`.
fn apply_patch(doc: &mut Value, patch: &Value) {
    if let Some(set) = patch.get("$set").and_then(Value::as_object) {
        if let Some(target) = doc.as_object_mut() {
            for (key, value) in set {
                target.insert(key.clone(), value.clone());
            }
        }
        return;
    }

    let id = doc.get("_id").cloned();
    *doc = patch.clone();
    if let (Some(target), Some(id)) = (doc.as_object_mut(), id) {
        target.entry("_id".to_string()).or_insert(id);
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn connect(&self) -> Result<(), StoreError> {
        if self.created.elapsed() < self.ready_after {
            return Err(StoreError::Backend("store not reachable".to_string()));
        }
        Ok(())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Value,
        options: &FindOptions,
    ) -> Result<Option<Value>, StoreError> {
        let found = self.find(collection, filter, options).await?;
        Ok(found.into_iter().next())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Value,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let docs = match self.collections.get(collection) {
            Some(docs) => docs
                .iter()
                .filter(|doc| matches_filter(doc, filter))
                .skip(options.skip)
                .take(options.limit.unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(docs)
    }

    async fn insert(&self, collection: &str, docs: Vec<Value>) -> Result<(), StoreError> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        for mut doc in docs {
            if let Some(object) = doc.as_object_mut() {
                object
                    .entry("_id".to_string())
                    .or_insert_with(|| Value::String(DocumentId::new().to_string()));
            }
            entry.push(doc);
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Value,
        patch: &Value,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, StoreError> {
        let mut report = UpdateReport::default();
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(report);
        };

        for doc in docs.iter_mut() {
            if !matches_filter(doc, filter) {
                continue;
            }
            report.matched += 1;
            let before = doc.clone();
            apply_patch(doc, patch);
            if *doc != before {
                report.modified += 1;
            }
            if !options.many {
                break;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn filter_matches_by_field_equality() {
        let backend = MemoryBackend::new();
        backend
            .insert(
                "users",
                vec![
                    json!({"name": "ada", "role": "admin"}),
                    json!({"name": "brin", "role": "user"}),
                ],
            )
            .await
            .unwrap();

        let admins = backend
            .find("users", &json!({"role": "admin"}), &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0]["name"], "ada");

        let all = backend
            .find("users", &json!({}), &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn find_preserves_insertion_order_and_limit() {
        let backend = MemoryBackend::new();
        for i in 0..5 {
            backend
                .insert("seq", vec![json!({"n": i})])
                .await
                .unwrap();
        }
        let opts = FindOptions {
            limit: Some(3),
            skip: 1,
        };
        let found = backend.find("seq", &json!({}), &opts).await.unwrap();
        let ns: Vec<i64> = found.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn insert_assigns_missing_ids() {
        let backend = MemoryBackend::new();
        backend
            .insert("docs", vec![json!({"x": 1})])
            .await
            .unwrap();
        let doc = backend
            .find_one("docs", &json!({}), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert!(DocumentId::is_valid(doc["_id"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn set_patch_merges_and_replace_keeps_id() {
        let backend = MemoryBackend::new();
        backend
            .insert("docs", vec![json!({"_id": "aaaaaaaaaaaaaaaaaaaaaaaa", "a": 1, "b": 2})])
            .await
            .unwrap();

        let report = backend
            .update(
                "docs",
                &json!({"a": 1}),
                &json!({"$set": {"b": 3}}),
                &UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(report, UpdateReport { matched: 1, modified: 1 });

        let doc = backend
            .find_one("docs", &json!({}), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["a"], 1);
        assert_eq!(doc["b"], 3);

        backend
            .update(
                "docs",
                &json!({}),
                &json!({"c": 9}),
                &UpdateOptions::default(),
            )
            .await
            .unwrap();
        let doc = backend
            .find_one("docs", &json!({}), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["_id"], "aaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(doc["c"], 9);
        assert!(doc.get("a").is_none());
    }

    #[tokio::test]
    async fn update_one_stops_at_first_match() {
        let backend = MemoryBackend::new();
        backend
            .insert("docs", vec![json!({"k": 1}), json!({"k": 1})])
            .await
            .unwrap();
        let report = backend
            .update(
                "docs",
                &json!({"k": 1}),
                &json!({"$set": {"seen": true}}),
                &UpdateOptions { many: false },
            )
            .await
            .unwrap();
        assert_eq!(report.matched, 1);

        let report = backend
            .update(
                "docs",
                &json!({"k": 1}),
                &json!({"$set": {"seen": true}}),
                &UpdateOptions { many: true },
            )
            .await
            .unwrap();
        assert_eq!(report.matched, 2);
    }

    #[tokio::test]
    async fn connect_respects_readiness_delay() {
        let backend = MemoryBackend::ready_after(Duration::from_secs(3600));
        assert!(backend.connect().await.is_err());

        let ready = MemoryBackend::new();
        assert!(ready.connect().await.is_ok());
    }
}
