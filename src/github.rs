//! Remote lookups against the GitHub REST API: default-branch resolution and the recursive
//! tree listing.
//!
//! Both calls are structural: any failure here aborts the run before anything is stored.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::fetch::{FetchResponse, Fetcher};
use crate::locator::RepositoryRef;

/// Object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Blob,
    Tree,
    Other,
}

impl From<&str> for EntryType {
    fn from(s: &str) -> Self {
        match s {
            "blob" => EntryType::Blob,
            "tree" => EntryType::Tree,
            _ => EntryType::Other,
        }
    }
}

/// One entry of the recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub entry_type: EntryType,
    /// API URL of the blob (or subtree) object.
    pub fetch_url: String,
    pub sha: Option<String>,
    /// Size reported by the listing; blobs only.
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.entry_type == EntryType::Blob
    }
}

/// Entries of a branch, in the order the API reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// Set when the API says the listing was cut short.
    pub truncated: bool,
}

pub fn repository_url(api_base: &str, repo: &RepositoryRef) -> String {
    format!("{}/repos/{}/{}", api_base, repo.owner(), repo.project())
}

pub fn tree_url(api_base: &str, repo: &RepositoryRef, branch: &str) -> String {
    format!(
        "{}/git/trees/{}?recursive=1",
        repository_url(api_base, repo),
        branch
    )
}

/// Turns a transport failure or a non-2xx status into an `Upstream` error.
pub(crate) async fn get_success(fetcher: &dyn Fetcher, url: &str) -> IngestResult<FetchResponse> {
    let response = fetcher
        .get(url)
        .await
        .map_err(|e| IngestError::upstream(url, format!("request failed: {e}")))?;

    if response.is_success() {
        return Ok(response);
    }

    let detail = response
        .body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("");
    let message = if response.is_rate_limited() {
        format!("rate limited (status {}) {detail}", response.status)
    } else {
        format!("status {} {detail}", response.status)
    };
    Err(IngestError::upstream(url, message.trim_end()))
}

/// Returns `repo` with its branch populated.
///
/// An explicit branch from the URL is kept as-is and no request is made. Otherwise the
/// repository metadata is fetched once and its `default_branch` is used.
pub async fn resolve_branch(
    fetcher: &dyn Fetcher,
    api_base: &str,
    repo: &RepositoryRef,
) -> IngestResult<RepositoryRef> {
    if let Some(branch) = repo.branch() {
        info!(repo = %repo, branch, "[BRANCH] Using branch from URL");
        return Ok(repo.clone());
    }

    let url = repository_url(api_base, repo);
    let response = get_success(fetcher, &url).await.map_err(|e| {
        error!(repo = %repo, error = %e, "[BRANCH][ERROR] Repository lookup failed");
        e
    })?;

    let branch = response
        .body
        .get("default_branch")
        .and_then(Value::as_str)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            error!(repo = %repo, "[BRANCH][ERROR] Response has no default_branch");
            IngestError::upstream(&url, "response is missing `default_branch`")
        })?;

    info!(repo = %repo, branch, "[BRANCH] Resolved default branch");
    Ok(repo.with_branch(branch))
}

/// Fetches the recursive tree of the resolved branch. A single request; no pagination.
pub async fn list_tree(
    fetcher: &dyn Fetcher,
    api_base: &str,
    repo: &RepositoryRef,
) -> IngestResult<TreeListing> {
    let branch = repo.branch().ok_or_else(|| {
        IngestError::upstream(
            &repository_url(api_base, repo),
            "branch must be resolved before listing the tree",
        )
    })?;
    let url = tree_url(api_base, repo, branch);

    let response = get_success(fetcher, &url).await.map_err(|e| {
        error!(repo = %repo, error = %e, "[TREE][ERROR] Tree lookup failed");
        e
    })?;

    let items = response
        .body
        .get("tree")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::upstream(&url, "response is missing the `tree` listing"))?;

    let entries = items
        .iter()
        .map(|item| parse_entry(&url, item))
        .collect::<IngestResult<Vec<_>>>()?;

    let truncated = response
        .body
        .get("truncated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if truncated {
        warn!(
            repo = %repo,
            entries = entries.len(),
            "[TREE] Upstream listing is truncated; only the returned entries will be ingested"
        );
    }

    info!(repo = %repo, entries = entries.len(), truncated, "[TREE] Listed repository tree");
    Ok(TreeListing { entries, truncated })
}

fn parse_entry(url: &str, item: &Value) -> IngestResult<TreeEntry> {
    let path = item
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| IngestError::upstream(url, "tree entry is missing `path`"))?;
    let entry_type = item
        .get("type")
        .and_then(Value::as_str)
        .map(EntryType::from)
        .unwrap_or(EntryType::Other);
    let fetch_url = item.get("url").and_then(Value::as_str).unwrap_or_default();
    if entry_type == EntryType::Blob && fetch_url.is_empty() {
        return Err(IngestError::upstream(
            url,
            format!("blob entry {path:?} is missing `url`"),
        ));
    }

    Ok(TreeEntry {
        path: path.to_string(),
        entry_type,
        fetch_url: fetch_url.to_string(),
        sha: item.get("sha").and_then(Value::as_str).map(str::to_string),
        size: item.get("size").and_then(Value::as_u64),
    })
}
