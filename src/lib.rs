#![doc = "repo-ingest: store the file tree of a hosted repository as documents."]

//! The library holds the whole ingestion pipeline; the binary only parses arguments and
//! wires the real HTTP client and store into [`ingest::Ingestor`].

pub mod classify;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod github;
pub mod ingest;
pub mod load_config;
pub mod locator;
pub mod policy;
pub mod sink;
pub mod store;

pub use classify::{classify, FileKind};
pub use cli::{run, Cli, Commands};
pub use document::{DocumentContent, FileDocument, SkipReason};
pub use error::{FileError, FileErrorKind, IngestError};
pub use ingest::{FileOutcome, Ingestor, RunResult};
pub use locator::RepositoryRef;
