//! # vectordocs CLI (`vdocs`)
//!
//! Indexes a source tree into line-level chunks and searches them.
//! The store lives in memory, so every command that searches first
//! ingests the directory it is given.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vdocs index <dir>` | Ingest a directory and print a summary |
//! | `vdocs search <dir> <query>...` | Ingest, then run each query |
//! | `vdocs shell <dir>` | Ingest, then answer queries read from stdin until `exit` |
//! | `vdocs tools` | Print the tool definitions exposed to a chat front-end |
//! | `vdocs call <tool> <json>` | Invoke a tool with JSON parameters |
//!
//! ## Examples
//!
//! ```bash
//! vdocs index ./src --extensions .cs,.js
//! vdocs search ./src "where is the retry policy configured"
//! vdocs call ingest_code_directory '{"directoryPath": "./src"}'
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use vectordocs::config::{load_or_default, Config};
use vectordocs::progress::ProgressMode;
use vectordocs::services::Services;
use vectordocs::tools::ToolRegistry;
use vectordocs_core::search::SearchHit;

const DEFAULT_CONFIG: &str = "./config/vdocs.toml";
const EXIT_COMMAND: &str = "exit";

/// vectordocs: index a source tree into line-level semantic chunks and
/// search them by similarity.
#[derive(Parser)]
#[command(name = "vdocs", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults to `./config/vdocs.toml`;
    /// built-in defaults are used when that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ingest progress on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that ingests a directory.
#[derive(Args, Clone)]
struct IngestArgs {
    /// Directory to index.
    dir: PathBuf,

    /// Comma-separated file name suffixes, e.g. `.cs,.js`. Defaults to `ingest.extensions`.
    #[arg(long)]
    extensions: Option<String>,

    /// Collection name. Defaults to `ingest.collection`.
    #[arg(long)]
    collection: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a directory and print the chunk and file counts.
    Index {
        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Ingest a directory, then run one or more queries against it.
    Search {
        #[command(flatten)]
        ingest: IngestArgs,

        /// Queries to run, in order.
        #[arg(required = true)]
        queries: Vec<String>,

        /// Maximum hits per query. Defaults to `search.limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Ingest a directory, then answer queries read from stdin until `exit`.
    Shell {
        #[command(flatten)]
        ingest: IngestArgs,

        /// Maximum hits per query. Defaults to `search.limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print tool definitions in function-calling format.
    Tools,

    /// Invoke a tool with JSON parameters and print its JSON result.
    Call {
        /// Tool name, e.g. `code_doc_search`.
        tool: String,

        /// Parameters as a JSON object.
        #[arg(default_value = "{}")]
        params: String,

        /// Ingest this directory before calling the tool.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_or_default(path, false)?,
        None => load_or_default(Path::new(DEFAULT_CONFIG), true)?,
    };
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
    let services = Services::from_config(config, progress.reporter())?;

    match cli.command {
        Commands::Index { ingest } => {
            let (collection, report) = run_ingest(&services, &ingest).await?;
            println!("ingest {}", ingest.dir.display());
            println!("  collection: {}", collection);
            println!("  files: {}", report.file_count);
            println!("  chunks: {}", report.chunk_count);
            println!("ok");
        }
        Commands::Search {
            ingest,
            queries,
            limit,
        } => {
            let (collection, _) = run_ingest(&services, &ingest).await?;
            let limit = limit.unwrap_or(services.config.search.limit);
            for query in &queries {
                let hits = services.search.search(query, &collection, limit).await?;
                if queries.len() > 1 {
                    println!("query: {}", query);
                }
                print_hits(&hits);
            }
        }
        Commands::Shell { ingest, limit } => {
            let (collection, report) = run_ingest(&services, &ingest).await?;
            let limit = limit.unwrap_or(services.config.search.limit);
            eprintln!(
                "indexed {} chunks from {} files. Type '{}' to quit.",
                report.chunk_count, report.file_count, EXIT_COMMAND
            );
            run_shell(&services, &collection, limit).await?;
        }
        Commands::Tools => {
            let registry = ToolRegistry::with_builtins();
            println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
        }
        Commands::Call { tool, params, dir } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("params must be a JSON object")?;
            if !params.is_object() {
                anyhow::bail!("params must be a JSON object");
            }
            if let Some(dir) = dir {
                let ingest = IngestArgs {
                    dir,
                    extensions: None,
                    collection: None,
                };
                run_ingest(&services, &ingest).await?;
            }
            let registry = ToolRegistry::with_builtins();
            let tool = registry
                .find(&tool)
                .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", tool))?;
            let result = tool.execute(params, &services.tool_context()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn run_ingest(
    services: &Services,
    args: &IngestArgs,
) -> Result<(String, vectordocs_core::ingest::IngestReport)> {
    let config: &Config = &services.config;
    let extensions = args
        .extensions
        .clone()
        .unwrap_or_else(|| config.ingest.extensions.clone());
    let collection = args
        .collection
        .clone()
        .unwrap_or_else(|| config.ingest.collection.clone());

    let report = services
        .ingestor
        .ingest(&args.dir, &extensions, &collection)
        .await?;
    Ok((collection, report))
}

async fn run_shell(services: &Services, collection: &str, limit: usize) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("query> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }
        if query.is_empty() {
            continue;
        }
        match services.search.search(query, collection, limit).await {
            Ok(hits) => print_hits(&hits),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("  (no results)");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{:.4}] {}  {}", i + 1, hit.score, hit.name, hit.link);
        println!("   {}", hit.text);
    }
}
