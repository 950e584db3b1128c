//! Command-line surface: argument parsing and wiring of the real transport and store into
//! the pipeline. All ingestion logic lives in [`crate::ingest`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classify::classify;
use crate::fetch::HttpFetcher;
use crate::ingest::{Ingestor, RunResult};
use crate::load_config::load_config;
use crate::store::{DocumentStore, FsStore, MemoryStore};

/// CLI for repo-ingest: store the files of a GitHub repository as documents.
#[derive(Parser)]
#[clap(
    name = "repo-ingest",
    version,
    about = "Ingest the file tree of a public GitHub repository into a document store"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every file of a repository and upsert it into the store
    Ingest {
        /// Repository URL, e.g. https://github.com/owner/project or .../tree/<branch>
        url: String,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Re-ingest even when the repository is already in the store
        #[clap(long)]
        force: bool,
        /// Keep documents in memory instead of writing them to the store
        #[clap(long)]
        dry_run: bool,
        /// Print the run result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Print the content kind of each path
    Classify {
        #[clap(required = true)]
        paths: Vec<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Ingest {
            url,
            config,
            force,
            dry_run,
            json,
        } => {
            let config = load_config(config)?;
            let store: Arc<dyn DocumentStore> = if dry_run {
                tracing::info!("[CLI] Dry run, documents stay in memory");
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(FsStore::new(config.store.output_dir.clone()))
            };
            let pipeline = config.pipeline();
            let repository_url = url.trim().trim_end_matches('/').to_string();

            let already_ingested = store
                .contains_repository(&pipeline.collection, &repository_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to query the store: {e}"))?;
            if already_ingested && !force {
                tracing::info!(repository_url = %repository_url, "[CLI] Repository already ingested, skipping");
                println!("Repository {repository_url} already ingested (cached). Use --force to re-run.");
                return Ok(());
            }

            let fetcher = HttpFetcher::new(&config.github)
                .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
            let ingestor = Ingestor::new(Arc::new(fetcher), store, pipeline);

            println!("Ingest starting...");
            match ingestor.ingest(&repository_url).await {
                Ok(result) => {
                    print_result(&result, json)?;
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Ingestion failed: {}", e);
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Classify { paths } => {
            for path in paths {
                println!("{}\t{}", classify(&path), path);
            }
            Ok(())
        }
    }
}

fn print_result(result: &RunResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("Ingest complete.\nReport:");
    println!("{:#?}", result);
    if result.truncated {
        println!("Warning: the upstream tree listing was truncated; some files were not ingested.");
    }
    Ok(())
}
