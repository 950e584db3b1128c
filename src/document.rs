//! The persisted unit: one [`FileDocument`] per file per repository.
//!
//! Field names are a durable contract for whoever reads the store. Content is carried by
//! [`DocumentContent`], which is flattened into the document and tagged by `content_kind`,
//! so a document holds exactly one of `content`, `content_base64`, or an explicit `reason`
//! for having none.

use serde::{Deserialize, Serialize};

use crate::classify::FileKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDocument {
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub name: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    #[serde(flatten)]
    pub content: DocumentContent,
}

impl FileDocument {
    pub fn key(&self) -> DocumentKey {
        DocumentKey {
            repo_url: self.repo_url.clone(),
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_kind", rename_all = "snake_case")]
pub enum DocumentContent {
    /// UTF-8 text of a textual file.
    Text { content: String },
    /// The encoded payload as received from the API.
    Base64 { content_base64: String },
    /// Content was fetched but deliberately not stored.
    None { reason: SkipReason },
}

impl DocumentContent {
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            DocumentContent::None { reason } => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A textual kind whose bytes are not valid UTF-8.
    Undecodable,
    /// An inline kind at or above the size limit.
    Oversized,
    /// A kind for which only metadata is kept.
    NotStored,
}

/// Storage identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub repo_url: String,
    pub path: String,
}
