//! Repository URL parsing.

use serde::Serialize;
use std::fmt;

use crate::error::{IngestError, IngestResult};

/// Owner/project coordinates of a hosted repository, with an optional branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    owner: String,
    project: String,
    branch: Option<String>,
}

impl RepositoryRef {
    /// Parses `https://host/owner/project` or `https://host/owner/project/tree/<branch>/...`.
    ///
    /// Scheme and host are discarded; a scheme-less `github.com/owner/project` is accepted too.
    /// Does not touch the network.
    pub fn parse(url: &str) -> IngestResult<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let segments = path_segments(trimmed);

        if segments.len() < 2 {
            return Err(IngestError::invalid_reference(
                url,
                "expected at least owner and project path segments",
            ));
        }

        let owner = segments[0].to_string();
        let project = segments[1].trim_end_matches(".git").to_string();
        if owner.is_empty() || project.is_empty() {
            return Err(IngestError::invalid_reference(
                url,
                "owner and project must be non-empty",
            ));
        }

        let branch = match (segments.get(2), segments.get(3)) {
            (Some(&"tree"), Some(branch)) if !branch.is_empty() => Some(branch.to_string()),
            _ => None,
        };

        Ok(RepositoryRef {
            owner,
            project,
            branch,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Returns a copy with the branch set. The receiver is left untouched.
    pub fn with_branch(&self, branch: impl Into<String>) -> Self {
        RepositoryRef {
            owner: self.owner.clone(),
            project: self.project.clone(),
            branch: Some(branch.into()),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{}", self.owner, self.project, branch),
            None => write!(f, "{}/{}", self.owner, self.project),
        }
    }
}

/// Splits the path part of a URL into segments, dropping scheme, host, query and fragment.
fn path_segments(url: &str) -> Vec<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);

    let path = match without_query.split_once("://") {
        Some((_scheme, rest)) => rest.split_once('/').map(|(_host, path)| path).unwrap_or(""),
        None => match without_query.split_once('/') {
            // `github.com/owner/project`: the first segment looks like a host name.
            Some((first, path)) if first.contains('.') => path,
            _ => without_query,
        },
    };

    path.split('/').filter(|s| !s.is_empty()).collect()
}
