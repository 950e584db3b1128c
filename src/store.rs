//! # store: document storage capability
//!
//! [`DocumentStore`] is the narrow interface the pipeline writes through: an idempotent
//! `upsert` keyed by [`DocumentKey`] within a named collection, plus the "already ingested"
//! probe used by the CLI.
//!
//! Two implementations ship with the crate:
//! - [`MemoryStore`]: in-process map, for tests and `--dry-run`.
//! - [`FsStore`]: one JSON file per document under a root directory. File names are SHA-256
//!   digests of the key parts, so the same key always lands on the same file and a re-run
//!   replaces it in place.

use async_trait::async_trait;
use mockall::automock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::document::{DocumentKey, FileDocument};

/// Error type for storage failures (simple boxed error, like the transport).
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document stored under `key`, or insert it. Creates the collection on
    /// first use.
    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &FileDocument,
    ) -> Result<(), StoreError>;

    /// Whether any document of `repo_url` exists in the collection.
    async fn contains_repository(&self, collection: &str, repo_url: &str)
        -> Result<bool, StoreError>;
}

type Collections = HashMap<String, HashMap<DocumentKey, FileDocument>>;

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents of a collection, ordered by key.
    pub fn documents(&self, collection: &str) -> Vec<FileDocument> {
        let collections = match self.collections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut docs: Vec<(DocumentKey, FileDocument)> = collections
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        docs.into_iter().map(|(_, doc)| doc).collect()
    }

    pub fn get(&self, collection: &str, key: &DocumentKey) -> Option<FileDocument> {
        let collections = match self.collections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        collections.get(collection).and_then(|c| c.get(key)).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &FileDocument,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|e| format!("memory store lock poisoned: {e}"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), document.clone());
        Ok(())
    }

    async fn contains_repository(
        &self,
        collection: &str,
        repo_url: &str,
    ) -> Result<bool, StoreError> {
        let collections = self
            .collections
            .lock()
            .map_err(|e| format!("memory store lock poisoned: {e}"))?;
        Ok(collections
            .get(collection)
            .is_some_and(|c| c.keys().any(|k| k.repo_url == repo_url)))
    }
}

/// Filesystem-backed store:
/// `<root>/<collection>/<sha256(repo_url)>/<sha256(path)>.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repository_dir(&self, collection: &str, repo_url: &str) -> PathBuf {
        self.root.join(collection).join(digest(repo_url))
    }

    /// Location of the file holding `key`.
    pub fn document_path(&self, collection: &str, key: &DocumentKey) -> PathBuf {
        self.repository_dir(collection, &key.repo_url)
            .join(format!("{}.json", digest(&key.path)))
    }

    fn write_document(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &FileDocument,
    ) -> Result<PathBuf, StoreError> {
        let target = self.document_path(collection, key);
        let dir = target
            .parent()
            .ok_or_else(|| format!("document path {} has no parent", target.display()))?;
        std::fs::create_dir_all(dir)?;

        // Write next to the target, then rename over it, so readers never see a partial file.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, document)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &FileDocument,
    ) -> Result<(), StoreError> {
        match self.write_document(collection, key, document) {
            Ok(path) => {
                debug!(path = %path.display(), file = %key.path, "[STORE] Upserted document");
                Ok(())
            }
            Err(e) => {
                error!(file = %key.path, error = %e, "[STORE][ERROR] Failed to write document");
                Err(e)
            }
        }
    }

    async fn contains_repository(
        &self,
        collection: &str,
        repo_url: &str,
    ) -> Result<bool, StoreError> {
        let dir = self.repository_dir(collection, repo_url);
        if !dir.is_dir() {
            return Ok(false);
        }
        let mut entries = std::fs::read_dir(&dir)?;
        Ok(entries.any(|e| {
            e.map(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .unwrap_or(false)
        }))
    }
}

fn digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
