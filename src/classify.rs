//! # classify: file path → content kind
//!
//! The one place where a file's kind is decided. Everything downstream (storage policy,
//! reporting) asks [`classify`] or [`FileKind::storage_class`] and never inspects extensions
//! itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content kind of a repository file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Python,
    Javascript,
    Typescript,
    Java,
    C,
    Cpp,
    Markdown,
    Text,
    Document,
    Pdf,
    Images,
    Video,
    Binary,
    Others,
}

/// How the storage policy treats a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    /// Decoded and stored as UTF-8 text.
    Text,
    /// Stored as base64 when below the inline size limit.
    Inline,
    /// Only metadata is recorded.
    MetadataOnly,
}

impl FileKind {
    pub const ALL: [FileKind; 14] = [
        FileKind::Python,
        FileKind::Javascript,
        FileKind::Typescript,
        FileKind::Java,
        FileKind::C,
        FileKind::Cpp,
        FileKind::Markdown,
        FileKind::Text,
        FileKind::Document,
        FileKind::Pdf,
        FileKind::Images,
        FileKind::Video,
        FileKind::Binary,
        FileKind::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Python => "python",
            FileKind::Javascript => "javascript",
            FileKind::Typescript => "typescript",
            FileKind::Java => "java",
            FileKind::C => "c",
            FileKind::Cpp => "cpp",
            FileKind::Markdown => "markdown",
            FileKind::Text => "text",
            FileKind::Document => "document",
            FileKind::Pdf => "pdf",
            FileKind::Images => "images",
            FileKind::Video => "video",
            FileKind::Binary => "binary",
            FileKind::Others => "others",
        }
    }

    pub fn storage_class(self) -> StorageClass {
        match self {
            FileKind::Python
            | FileKind::Javascript
            | FileKind::Typescript
            | FileKind::Java
            | FileKind::C
            | FileKind::Cpp
            | FileKind::Markdown
            | FileKind::Text => StorageClass::Text,
            FileKind::Images | FileKind::Pdf | FileKind::Others => StorageClass::Inline,
            FileKind::Document | FileKind::Video | FileKind::Binary => StorageClass::MetadataOnly,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const EXTENSION_KINDS: &[(&str, FileKind)] = &[
    ("py", FileKind::Python),
    ("ipynb", FileKind::Python),
    ("js", FileKind::Javascript),
    ("ts", FileKind::Typescript),
    ("java", FileKind::Java),
    ("c", FileKind::C),
    ("cpp", FileKind::Cpp),
    ("md", FileKind::Markdown),
    ("rst", FileKind::Markdown),
    ("txt", FileKind::Text),
    ("csv", FileKind::Text),
    ("json", FileKind::Text),
    ("html", FileKind::Text),
    ("docx", FileKind::Document),
    ("xlsx", FileKind::Document),
    ("pdf", FileKind::Pdf),
    ("png", FileKind::Images),
    ("jpg", FileKind::Images),
    ("jpeg", FileKind::Images),
    ("gif", FileKind::Images),
    ("mp4", FileKind::Video),
    ("pbix", FileKind::Binary),
    ("pyc", FileKind::Binary),
];

/// Returns the lower-cased extension of the last path component, if it has one.
/// Dotfiles such as `.gitignore` have no extension.
fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classify a repository path by its extension. Total: unknown extensions are `Others`.
pub fn classify(path: &str) -> FileKind {
    extension(path)
        .and_then(|ext| {
            EXTENSION_KINDS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, kind)| *kind)
        })
        .unwrap_or(FileKind::Others)
}
