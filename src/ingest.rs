//! High-level pipeline: locate → resolve branch → list tree → classify/fetch/store each blob.
//!
//! # Responsibilities
//! - Structural steps (URL parsing, branch resolution, tree listing) run sequentially and
//!   fail fast: the run returns the single fatal error and nothing has been written.
//! - Per-file steps run with bounded concurrency. Each file ends in a [`FileOutcome`]; a
//!   failed file is recorded in [`RunResult::errors`] and never stops the others.
//! - Text that is not valid UTF-8 is a recoverable skip, counted as processed.
//!
//! # Dependencies
//! Both the transport ([`Fetcher`]) and the store ([`DocumentStore`]) are injected by the
//! caller, so tests run the whole pipeline against fixtures.
//!
//! # Navigation
//! - Entry point: [`Ingestor::ingest`]
//! - Output: [`RunResult`]

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classify::classify;
use crate::config::IngestConfig;
use crate::document::SkipReason;
use crate::error::{FileError, IngestResult};
use crate::fetch::Fetcher;
use crate::github::{list_tree, resolve_branch, TreeEntry};
use crate::locator::RepositoryRef;
use crate::policy::{fetch_document, DocumentContext};
use crate::sink::Sink;
use crate::store::DocumentStore;

/// Result of ingesting one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Stored,
    /// Stored with metadata only.
    StoredWithoutContent(SkipReason),
    Failed(FileError),
}

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub repository_url: String,
    pub owner: String,
    pub project: String,
    pub branch: String,
    /// Blobs whose document was stored, with or without content.
    pub files_processed: usize,
    /// Subset of `files_processed` stored without content.
    pub files_without_content: usize,
    /// The upstream listing was incomplete.
    pub truncated: bool,
    /// Failed files, ordered by path.
    pub errors: Vec<FileError>,
}

impl RunResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.truncated
    }
}

/// Runs ingestion with an injected transport and store.
pub struct Ingestor {
    fetcher: Arc<dyn Fetcher>,
    sink: Sink,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn DocumentStore>,
        config: IngestConfig,
    ) -> Self {
        let sink = Sink::new(store, config.collection.clone());
        Ingestor {
            fetcher,
            sink,
            config,
        }
    }

    /// Ingests every blob of the repository at `repository_url`.
    ///
    /// Returns `Err` only for structural failures (`InvalidReference`, or `Upstream` while
    /// resolving the branch or listing the tree). Per-file failures are reported in the
    /// returned [`RunResult`].
    pub async fn ingest(&self, repository_url: &str) -> IngestResult<RunResult> {
        let repository_url = repository_url.trim().trim_end_matches('/');
        info!(repository_url, "[INGEST] Starting repository ingestion");

        let located = RepositoryRef::parse(repository_url).map_err(|e| {
            error!(error = %e, "[INGEST][ERROR] Invalid repository reference");
            e
        })?;

        let api_base = self.config.api_base.as_str();
        let repo = resolve_branch(self.fetcher.as_ref(), api_base, &located).await?;
        let listing = list_tree(self.fetcher.as_ref(), api_base, &repo).await?;

        let ctx = DocumentContext {
            repo_url: repository_url,
            repo: &repo,
        };
        let blobs: Vec<&TreeEntry> = listing.entries.iter().filter(|e| e.is_blob()).collect();
        info!(
            repo = %repo,
            blobs = blobs.len(),
            concurrency = self.config.concurrency,
            "[INGEST] Processing blobs"
        );

        let outcomes: Vec<FileOutcome> = stream::iter(blobs)
            .map(|entry| self.ingest_file(&ctx, entry))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut files_processed = 0;
        let mut files_without_content = 0;
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Stored => files_processed += 1,
                FileOutcome::StoredWithoutContent(_) => {
                    files_processed += 1;
                    files_without_content += 1;
                }
                FileOutcome::Failed(e) => errors.push(e),
            }
        }
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        let result = RunResult {
            run_id: Uuid::new_v4(),
            repository_url: repository_url.to_string(),
            owner: repo.owner().to_string(),
            project: repo.project().to_string(),
            branch: repo.branch().unwrap_or_default().to_string(),
            files_processed,
            files_without_content,
            truncated: listing.truncated,
            errors,
        };

        if result.errors.is_empty() {
            info!(
                repo = %repo,
                files_processed,
                files_without_content,
                truncated = result.truncated,
                "[INGEST] Repository ingested"
            );
        } else {
            warn!(
                repo = %repo,
                files_processed,
                failed = result.errors.len(),
                "[INGEST] Repository ingested with failures"
            );
        }
        Ok(result)
    }

    async fn ingest_file(&self, ctx: &DocumentContext<'_>, entry: &TreeEntry) -> FileOutcome {
        let kind = classify(&entry.path);

        let document = match fetch_document(self.fetcher.as_ref(), ctx, entry, kind).await {
            Ok(document) => document,
            Err(e) => {
                error!(file = %entry.path, error = %e, "[INGEST][ERROR] Fetch failed");
                return FileOutcome::Failed(FileError::from_error(&entry.path, &e));
            }
        };

        if let Err(e) = self.sink.upsert(&document).await {
            return FileOutcome::Failed(FileError::from_error(&entry.path, &e));
        }

        match document.content.skip_reason() {
            Some(reason) => FileOutcome::StoredWithoutContent(reason),
            None => FileOutcome::Stored,
        }
    }
}
