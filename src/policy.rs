//! # policy: blob fetch and storage decision
//!
//! Given one blob entry and its kind, fetch the blob, decode the transport encoding and
//! decide what of it goes into the [`FileDocument`]:
//!
//! | storage class  | kinds                                        | stored                       |
//! |----------------|----------------------------------------------|------------------------------|
//! | `Text`         | python, javascript, typescript, java, c, cpp, markdown, text | UTF-8 text, or `undecodable` |
//! | `Inline`       | images, pdf, others                          | base64 below 1 MB, else `oversized` |
//! | `MetadataOnly` | document, video, binary                      | `not_stored`                 |
//!
//! Text is never size-limited. Nothing is persisted here; see [`crate::sink`].

use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::classify::{FileKind, StorageClass};
use crate::document::{DocumentContent, FileDocument, SkipReason};
use crate::error::{IngestError, IngestResult};
use crate::fetch::Fetcher;
use crate::github::{get_success, TreeEntry};
use crate::locator::RepositoryRef;

/// Inline kinds are stored only when strictly smaller than this many raw bytes.
pub const INLINE_CONTENT_LIMIT: usize = 1_000_000;

/// A blob as returned by the API: the payload as received plus its decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPayload {
    /// Base64 text exactly as received (line breaks included), for `Inline` storage.
    pub encoded: String,
    pub raw: Vec<u8>,
}

impl BlobPayload {
    /// Decodes a blob response body (`{"content": ..., "encoding": "base64" | "utf-8"}`).
    pub fn from_response(url: &str, body: &Value) -> IngestResult<Self> {
        let content = body
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| IngestError::upstream(url, "blob response is missing `content`"))?;
        let encoding = body
            .get("encoding")
            .and_then(Value::as_str)
            .unwrap_or("base64");

        match encoding {
            "base64" => {
                let compact: String = content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let raw = base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| IngestError::upstream(url, format!("invalid base64 payload: {e}")))?;
                Ok(BlobPayload {
                    encoded: content.to_string(),
                    raw,
                })
            }
            "utf-8" | "utf8" => Ok(BlobPayload {
                encoded: base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
                raw: content.as_bytes().to_vec(),
            }),
            other => Err(IngestError::upstream(
                url,
                format!("unsupported blob encoding {other:?}"),
            )),
        }
    }
}

/// Repository-level fields shared by every document of a run.
#[derive(Debug, Clone)]
pub struct DocumentContext<'a> {
    pub repo_url: &'a str,
    pub repo: &'a RepositoryRef,
}

/// Applies the storage policy. Pure: no I/O.
pub fn build_document(
    ctx: &DocumentContext<'_>,
    path: &str,
    kind: FileKind,
    payload: BlobPayload,
) -> FileDocument {
    let size_bytes = payload.raw.len() as u64;
    let content = match kind.storage_class() {
        StorageClass::Text => match String::from_utf8(payload.raw) {
            Ok(text) => DocumentContent::Text { content: text },
            Err(_) => {
                debug!(path, "[POLICY] Text file is not valid UTF-8, storing without content");
                DocumentContent::None {
                    reason: SkipReason::Undecodable,
                }
            }
        },
        StorageClass::Inline if payload.raw.len() < INLINE_CONTENT_LIMIT => {
            DocumentContent::Base64 {
                content_base64: payload.encoded,
            }
        }
        StorageClass::Inline => {
            debug!(path, size_bytes, "[POLICY] File too large to inline, storing without content");
            DocumentContent::None {
                reason: SkipReason::Oversized,
            }
        }
        StorageClass::MetadataOnly => DocumentContent::None {
            reason: SkipReason::NotStored,
        },
    };

    FileDocument {
        repo_url: ctx.repo_url.to_string(),
        owner: ctx.repo.owner().to_string(),
        repo: ctx.repo.project().to_string(),
        branch: ctx.repo.branch().unwrap_or_default().to_string(),
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        kind,
        size_bytes,
        content,
    }
}

/// Fetches the blob behind `entry` and builds its document.
///
/// Fails with `Upstream` when the blob request fails or its payload cannot be decoded; the
/// caller scopes that failure to this file.
pub async fn fetch_document(
    fetcher: &dyn Fetcher,
    ctx: &DocumentContext<'_>,
    entry: &TreeEntry,
    kind: FileKind,
) -> IngestResult<FileDocument> {
    let response = get_success(fetcher, &entry.fetch_url).await?;
    let payload = BlobPayload::from_response(&entry.fetch_url, &response.body)?;
    debug!(path = %entry.path, %kind, bytes = payload.raw.len(), "[POLICY] Fetched blob");
    Ok(build_document(ctx, &entry.path, kind, payload))
}
