//! hybridrag CLI - build and query a hybrid keyword + vector index.
//!
//! # Usage
//!
//! ```bash
//! # Index a JSON corpus
//! hybridrag build --corpus docs.json
//!
//! # Search the saved index
//! hybridrag search "reset my password"
//! hybridrag search "invoice download" -n 5 --method keyword
//! hybridrag search "query" --json
//!
//! # Print one document
//! hybridrag show faq-1
//! ```

mod build;
mod config;
mod output;
mod search;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hybridrag_core::config::DEFAULT_EMBEDDING_DIM;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hybrid BM25 + vector retrieval over a document corpus.
#[derive(Parser)]
#[command(name = "hybridrag", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Custom data directory (default: platform standard location)
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// JSON retrieval config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build and save an index from a JSON array of documents
    Build {
        /// Corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Embedding dimension
        #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
        dimension: usize,
    },
    /// Search the saved index
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to return
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// keyword, semantic or hybrid
        #[arg(short, long, default_value = "hybrid")]
        method: String,
    },
    /// Print a document by id
    Show {
        /// Document id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = config::get_data_dir(cli.data_dir.as_ref())?;
    let retrieval_config = config::load_config(cli.config.as_deref(), &data_dir)?;

    let output = match cli.command {
        Command::Build { corpus, dimension } => {
            let summary = build::execute_build(corpus, dimension, retrieval_config).await?;
            output::format_build(&summary, cli.json)
        }
        Command::Search {
            query,
            limit,
            method,
        } => {
            let results =
                search::execute_search(query.clone(), limit, method.clone(), retrieval_config)
                    .await?;
            if cli.json {
                output::format_json(&query, &method, &results)
            } else {
                output::format_human(&query, &method, &results)
            }
        }
        Command::Show { id } => {
            let document = search::execute_show(id, retrieval_config).await?;
            output::format_document(&document, cli.json)
        }
    };

    println!("{}", output);
    Ok(())
}
