//! Idempotent sink: writes documents keyed by `(repo_url, path)`.

use std::sync::Arc;
use tracing::{debug, error};

use crate::document::FileDocument;
use crate::error::{IngestError, IngestResult};
use crate::store::DocumentStore;

/// Upserts documents into one collection of a [`DocumentStore`].
///
/// Re-running with an unchanged upstream converges to the same stored state, and a changed
/// file only overwrites its own document.
#[derive(Clone)]
pub struct Sink {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl Sink {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Sink {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn upsert(&self, document: &FileDocument) -> IngestResult<()> {
        let key = document.key();
        self.store
            .upsert(&self.collection, &key, document)
            .await
            .map_err(|e| {
                error!(file = %key.path, error = %e, "[SINK][ERROR] Upsert failed");
                IngestError::Storage(format!("{}: {e}", key.path))
            })?;
        debug!(file = %key.path, collection = %self.collection, "[SINK] Document upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FileKind;
    use crate::document::{DocumentContent, SkipReason};
    use crate::store::{MemoryStore, MockDocumentStore};

    fn doc() -> FileDocument {
        FileDocument {
            repo_url: "https://github.com/acme/widgets".into(),
            owner: "acme".into(),
            repo: "widgets".into(),
            branch: "main".into(),
            path: "clip.mp4".into(),
            name: "clip.mp4".into(),
            kind: FileKind::Video,
            size_bytes: 10,
            content: DocumentContent::None {
                reason: SkipReason::NotStored,
            },
        }
    }

    #[tokio::test]
    async fn upserts_under_repo_url_and_path() {
        let store = MemoryStore::new();
        let sink = Sink::new(Arc::new(store.clone()), "github_data");
        let document = doc();

        sink.upsert(&document).await.unwrap();
        sink.upsert(&document).await.unwrap();

        assert_eq!(store.documents("github_data"), vec![document.clone()]);
        assert_eq!(
            store.get("github_data", &document.key()),
            Some(document)
        );
    }

    #[tokio::test]
    async fn store_failures_become_storage_errors() {
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert()
            .returning(|_, _, _| Err("connection reset".into()));
        let sink = Sink::new(Arc::new(store), "github_data");

        let err = sink.upsert(&doc()).await.unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
        assert!(err.to_string().contains("connection reset"));
        assert!(err.to_string().contains("clip.mp4"));
    }
}
