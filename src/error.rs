//! Error taxonomy for the ingestion pipeline.
//!
//! Structural errors (`InvalidReference`, and `Upstream` raised while resolving the branch
//! or listing the tree) abort a run. The same `Upstream` and `Storage` variants are scoped to
//! a single file when they happen during per-file work, and end up in [`FileError`] records
//! instead of aborting.
//!
//! Text that cannot be decoded as UTF-8 is not an error at all; see
//! [`crate::document::SkipReason::Undecodable`].

use serde::Serialize;
use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid repository reference {url:?}: {reason}")]
    InvalidReference { url: String, reason: String },

    #[error("Upstream error for {url}: {message}")]
    Upstream { url: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IngestError {
    pub fn invalid_reference(url: &str, reason: impl Into<String>) -> Self {
        IngestError::InvalidReference {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn upstream(url: &str, message: impl Into<String>) -> Self {
        IngestError::Upstream {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Classifies this error for per-file reporting. Returns `None` for errors that can only
    /// ever be fatal to the whole run.
    pub fn file_error_kind(&self) -> Option<FileErrorKind> {
        match self {
            IngestError::InvalidReference { .. } => None,
            IngestError::Upstream { .. } => Some(FileErrorKind::Upstream),
            IngestError::Storage(_) => Some(FileErrorKind::Storage),
        }
    }
}

/// Which stage of the per-file work failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    #[serde(rename = "upstream_error")]
    Upstream,
    #[serde(rename = "storage_error")]
    Storage,
}

/// A failed file, as reported in [`crate::ingest::RunResult::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: String,
    pub kind: FileErrorKind,
    pub message: String,
}

impl FileError {
    pub fn from_error(path: &str, error: &IngestError) -> Self {
        FileError {
            path: path.to_string(),
            // An InvalidReference never reaches per-file work; treat it as upstream if it does.
            kind: error.file_error_kind().unwrap_or(FileErrorKind::Upstream),
            message: error.to_string(),
        }
    }
}
