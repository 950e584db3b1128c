use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_COLLECTION: &str = "github_data";

/// Full runtime configuration, as merged from the YAML file and the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub ingest: IngestSection,
    pub store: StoreConfig,
}

/// Where and how to reach the hosting API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    /// Never read from the config file; injected from `GITHUB_TOKEN`.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The `ingest:` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Upper bound on files fetched and stored at the same time.
    pub concurrency: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        IngestSection {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Per-run pipeline settings, as handed to [`crate::ingest::Ingestor`].
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_base: String,
    pub collection: String,
    pub concurrency: usize,
}

/// Document store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub output_dir: PathBuf,
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            output_dir: PathBuf::from("./storage"),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl Config {
    /// Settings handed to the pipeline, with the API base and collection taken from their
    /// owning sections.
    pub fn pipeline(&self) -> IngestConfig {
        IngestConfig {
            api_base: self.github.api_base.trim_end_matches('/').to_string(),
            collection: self.store.collection.clone(),
            concurrency: self.ingest.concurrency,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            api_base = %self.github.api_base,
            timeout_secs = self.github.timeout_secs,
            authenticated = self.github.token.is_some(),
            concurrency = self.ingest.concurrency,
            output_dir = %self.store.output_dir.display(),
            collection = %self.store.collection,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
