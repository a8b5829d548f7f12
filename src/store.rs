//! In-process implementation of the data service contracts.
//!
//! [`LocalStore`] keeps every collection as an insertion-ordered list of JSON
//! records and every uploaded object as raw bytes. It can run purely in memory
//! (tests) or be rooted at a directory (the CLI), in which case it persists:
//!
//! ```text
//! <root>/
//! ├── tables.json                  # all collections, versioned snapshot
//! └── objects/<bucket>/<key>       # uploaded files, byte for byte
//! ```
//!
//! Every mutation is applied to a copy of the tables, written out, and only
//! then made current, so a failed write leaves nothing behind. A snapshot whose
//! version doesn't match [`SNAPSHOT_VERSION`] is rejected rather than silently
//! discarded, since unlike a cache it holds the only copy of the data.
//!
//! ## Server-side behavior
//!
//! The store mirrors what the hosted service does on insert: a missing `id`
//! is filled with a fresh UUID and a missing `created_at` with the current
//! UTC time. Ties when ordering by a column are broken by insertion sequence
//! in the same direction, so rows inserted within the same clock tick still
//! come back newest-first for a descending `created_at` query.
//!
//! ## Fault injection
//!
//! [`LocalStore::fail`] arms a [`Fault`] that makes matching calls return the
//! corresponding [`RemoteError`] until [`LocalStore::heal`] is called. Tests
//! use this to exercise the degrade and no-mutation paths.

use crate::remote::{
    ObjectStorage, Query, Record, RemoteCollection, RemoteError, compare_values,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::RwLock;

const SNAPSHOT_FILENAME: &str = "tables.json";
const OBJECTS_DIR: &str = "objects";

/// Version of the on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {SNAPSHOT_VERSION})")]
    Version { found: u32 },
}

/// A failure to inject into matching store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Every query on the collection fails.
    Query(String),
    /// Every insert into the collection fails.
    Insert(String),
    /// Updates to the given record id fail (any collection).
    UpdateOf(String),
    /// Every update on the collection fails.
    Update(String),
    /// Every delete on the collection fails.
    Delete(String),
    /// Every upload fails.
    Upload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    sequence: u64,
    #[serde(default)]
    collections: BTreeMap<String, Vec<Row>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    seq: u64,
    record: Record,
}

/// Local stand-in for the hosted data service.
pub struct LocalStore {
    root: Option<PathBuf>,
    public_base: String,
    tables: RwLock<Snapshot>,
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
}

impl LocalStore {
    /// A store that lives only as long as the value does.
    pub fn in_memory(public_base: impl Into<String>) -> Self {
        Self {
            root: None,
            public_base: public_base.into(),
            tables: RwLock::new(Snapshot {
                version: SNAPSHOT_VERSION,
                ..Snapshot::default()
            }),
            objects: RwLock::new(HashMap::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Open (or start) a store persisted under `root`.
    pub async fn open(root: &Path, public_base: impl Into<String>) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(root).await?;
        let path = root.join(SNAPSHOT_FILENAME);
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::Version {
                        found: snapshot.version,
                    });
                }
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot {
                version: SNAPSHOT_VERSION,
                ..Snapshot::default()
            },
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(root = %root.display(), "opened local store");
        Ok(Self {
            root: Some(root.to_path_buf()),
            tables: RwLock::new(snapshot),
            ..Self::in_memory(public_base)
        })
    }

    /// Arm a fault. Stays armed until [`heal`](Self::heal).
    pub fn fail(&self, fault: Fault) {
        self.faults_guard().push(fault);
    }

    /// Disarm every fault.
    pub fn heal(&self) {
        self.faults_guard().clear();
    }

    /// Bytes previously uploaded under `bucket`/`key`, if any.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        if let Some(bytes) = self
            .objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
        {
            return Some(bytes.clone());
        }
        let root = self.root.as_ref()?;
        tokio::fs::read(root.join(OBJECTS_DIR).join(bucket).join(key))
            .await
            .ok()
    }

    fn faults_guard(&self) -> std::sync::MutexGuard<'_, Vec<Fault>> {
        // A poisoned fault list only means a test panicked mid-arm.
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tripped(&self, wanted: impl Fn(&Fault) -> bool) -> bool {
        self.faults_guard().iter().any(wanted)
    }

    /// Write `next` to disk, then make it current. A failed write leaves the
    /// tables as they were.
    async fn commit(
        &self,
        current: &mut Snapshot,
        next: Snapshot,
        collection: &str,
    ) -> Result<(), RemoteError> {
        self.persist(&next)
            .await
            .map_err(|e| RemoteError::mutation(collection, e))?;
        *current = next;
        Ok(())
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), String> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
        tokio::fs::write(root.join(SNAPSHOT_FILENAME), json)
            .await
            .map_err(|e| e.to_string())
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RemoteCollection for LocalStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>, RemoteError> {
        if self.tripped(|f| matches!(f, Fault::Query(c) if c == collection)) {
            return Err(RemoteError::query(collection, "injected fault"));
        }
        let tables = self.tables.read().await;
        let mut rows: Vec<&Row> = tables
            .collections
            .get(collection)
            .map(|rows| rows.iter().filter(|r| query.matches(&r.record)).collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.record.get(&order.column),
                    b.record.get(&order.column),
                )
                .then(a.seq.cmp(&b.seq));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        Ok(rows.into_iter().map(|r| r.record.clone()).collect())
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Record, RemoteError> {
        if self.tripped(|f| matches!(f, Fault::Query(c) if c == collection)) {
            return Err(RemoteError::query(collection, "injected fault"));
        }
        let tables = self.tables.read().await;
        tables
            .collections
            .get(collection)
            .and_then(|rows| rows.iter().find(|r| record_id(&r.record) == Some(id)))
            .map(|r| r.record.clone())
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn insert(&self, collection: &str, mut record: Record) -> Result<Record, RemoteError> {
        if self.tripped(|f| matches!(f, Fault::Insert(c) if c == collection)) {
            return Err(RemoteError::mutation(collection, "injected fault"));
        }
        let mut tables = self.tables.write().await;

        let id = match record_id(&record) {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                record.insert("id".into(), Value::String(id.clone()));
                id
            }
        };
        if !record.contains_key("created_at") {
            record.insert(
                "created_at".into(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }

        let mut next = tables.clone();
        next.sequence += 1;
        let seq = next.sequence;
        let rows = next.collections.entry(collection.to_string()).or_default();
        if rows.iter().any(|r| record_id(&r.record) == Some(id.as_str())) {
            return Err(RemoteError::mutation(
                collection,
                format!("duplicate key '{id}'"),
            ));
        }
        rows.push(Row {
            seq,
            record: record.clone(),
        });
        self.commit(&mut tables, next, collection).await?;
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<(), RemoteError> {
        if self.tripped(|f| match f {
            Fault::Update(c) => c == collection,
            Fault::UpdateOf(target) => target == id,
            _ => false,
        }) {
            return Err(RemoteError::mutation(collection, "injected fault"));
        }
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        let row = next
            .collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(&r.record) == Some(id)))
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (column, value) in patch {
            if column != "id" {
                row.record.insert(column, value);
            }
        }
        self.commit(&mut tables, next, collection).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        if self.tripped(|f| matches!(f, Fault::Delete(c) if c == collection)) {
            return Err(RemoteError::mutation(collection, "injected fault"));
        }
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        if let Some(rows) = next.collections.get_mut(collection) {
            rows.retain(|r| record_id(&r.record) != Some(id));
        }
        self.commit(&mut tables, next, collection).await
    }
}

#[async_trait]
impl ObjectStorage for LocalStore {
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), RemoteError> {
        if self.tripped(|f| matches!(f, Fault::Upload)) {
            return Err(RemoteError::upload(bucket, key, "injected fault"));
        }
        if key.is_empty() || key.contains('/') || key.contains("..") {
            return Err(RemoteError::upload(bucket, key, "invalid object key"));
        }
        let mut objects = self.objects.write().await;
        let slot = (bucket.to_string(), key.to_string());
        // Keys are content-addressed, so identical bytes under an existing key
        // are a repeat upload rather than a conflict.
        if let Some(existing) = objects.get(&slot) {
            return if existing.as_slice() == bytes {
                Ok(())
            } else {
                Err(RemoteError::upload(bucket, key, "object already exists"))
            };
        }
        if let Some(root) = &self.root {
            let dir = root.join(OBJECTS_DIR).join(bucket);
            let path = dir.join(key);
            if let Ok(existing) = tokio::fs::read(&path).await {
                return if existing == bytes {
                    Ok(())
                } else {
                    Err(RemoteError::upload(bucket, key, "object already exists"))
                };
            }
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| RemoteError::upload(bucket, key, e.to_string()))?;
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| RemoteError::upload(bucket, key, e.to_string()))?;
        }
        objects.insert(slot, bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base.trim_end_matches('/'), bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let store = LocalStore::in_memory("https://cdn.test");
        let row = store
            .insert("partners", record(json!({"name": "Acme"})))
            .await
            .unwrap();
        assert!(row.get("id").and_then(Value::as_str).is_some());
        assert!(row.get("created_at").and_then(Value::as_str).is_some());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = LocalStore::in_memory("https://cdn.test");
        store
            .insert("projects", record(json!({"id": "a"})))
            .await
            .unwrap();
        let err = store
            .insert("projects", record(json!({"id": "a"})))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Mutation { .. }));
    }

    #[tokio::test]
    async fn descending_order_breaks_ties_newest_first() {
        let store = LocalStore::in_memory("https://cdn.test");
        for id in ["a", "b", "c"] {
            store
                .insert(
                    "projects",
                    record(json!({"id": id, "created_at": "2024-01-01T00:00:00Z"})),
                )
                .await
                .unwrap();
        }
        let rows = store
            .query("projects", &Query::new().order_by("created_at", false))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().filter_map(record_id).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn query_filters_and_sorts_numerically() {
        let store = LocalStore::in_memory("https://cdn.test");
        for (id, order, shown) in [("a", 10, true), ("b", 2, true), ("c", 5, false)] {
            store
                .insert(
                    "partners",
                    record(json!({"id": id, "sort_order": order, "shown": shown})),
                )
                .await
                .unwrap();
        }
        let rows = store
            .query(
                "partners",
                &Query::new().eq("shown", true).order_by("sort_order", true),
            )
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().filter_map(record_id).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn update_merges_patch_and_keeps_id() {
        let store = LocalStore::in_memory("https://cdn.test");
        store
            .insert("partners", record(json!({"id": "a", "sort_order": 1})))
            .await
            .unwrap();
        store
            .update(
                "partners",
                "a",
                record(json!({"id": "zzz", "sort_order": 7})),
            )
            .await
            .unwrap();
        let row = store.get_by_id("partners", "a").await.unwrap();
        assert_eq!(row.get("sort_order"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = LocalStore::in_memory("https://cdn.test");
        let err = store
            .update("partners", "ghost", Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound { .. }));
    }

    #[tokio::test]
    async fn faults_trip_until_healed() {
        let store = LocalStore::in_memory("https://cdn.test");
        store.fail(Fault::Query("projects".into()));
        assert!(store.query("projects", &Query::new()).await.is_err());
        assert!(store.query("partners", &Query::new()).await.is_ok());
        store.heal();
        assert!(store.query("projects", &Query::new()).await.is_ok());
    }

    #[tokio::test]
    async fn targeted_update_fault_only_hits_that_id() {
        let store = LocalStore::in_memory("https://cdn.test");
        for id in ["a", "b"] {
            store
                .insert("partners", record(json!({"id": id})))
                .await
                .unwrap();
        }
        store.fail(Fault::UpdateOf("b".into()));
        assert!(store.update("partners", "a", Record::new()).await.is_ok());
        assert!(store.update("partners", "b", Record::new()).await.is_err());
    }

    #[tokio::test]
    async fn upload_and_public_url() {
        let store = LocalStore::in_memory("https://cdn.test/public/");
        store
            .upload_object("images", "logo.png", b"png")
            .await
            .unwrap();
        assert_eq!(
            store.object("images", "logo.png").await.as_deref(),
            Some(&b"png"[..])
        );
        assert_eq!(
            store.public_url("images", "logo.png"),
            "https://cdn.test/public/images/logo.png"
        );
        assert!(store.upload_object("images", "logo.png", b"png").await.is_ok());
        assert!(store.upload_object("images", "logo.png", b"x").await.is_err());
        assert!(store.upload_object("images", "../x", b"x").await.is_err());
    }

    #[tokio::test]
    async fn persisted_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LocalStore::open(tmp.path(), "/files").await.unwrap();
            store
                .insert("partners", record(json!({"id": "a", "name": "Acme"})))
                .await
                .unwrap();
            store.upload_object("images", "a.png", b"logo").await.unwrap();
        }
        let store = LocalStore::open(tmp.path(), "/files").await.unwrap();
        let row = store.get_by_id("partners", "a").await.unwrap();
        assert_eq!(row.get("name"), Some(&json!("Acme")));
        assert_eq!(store.object("images", "a.png").await, Some(b"logo".to_vec()));
    }

    #[tokio::test]
    async fn failed_snapshot_write_applies_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path(), "/files").await.unwrap();
        store
            .insert("partners", record(json!({"id": "a", "sort_order": 1})))
            .await
            .unwrap();

        // A directory where the snapshot file should be makes every write fail.
        let snapshot = tmp.path().join(SNAPSHOT_FILENAME);
        std::fs::remove_file(&snapshot).unwrap();
        std::fs::create_dir(&snapshot).unwrap();

        let err = store
            .insert("partners", record(json!({"id": "b", "sort_order": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Mutation { .. }));
        assert!(
            store
                .update("partners", "a", record(json!({"sort_order": 9})))
                .await
                .is_err()
        );
        assert!(store.delete("partners", "a").await.is_err());

        let rows = store.query("partners", &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("sort_order"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn unknown_snapshot_version_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(SNAPSHOT_FILENAME),
            r#"{"version": 99, "collections": {}}"#,
        )
        .unwrap();
        let result = LocalStore::open(tmp.path(), "/files").await;
        assert!(matches!(result, Err(StoreError::Version { found: 99 })));
    }
}
