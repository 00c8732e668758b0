//! # KGraph CLI (`kgraph`)
//!
//! Two commands:
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kgraph serve` | Start the MCP streamable-HTTP server |
//! | `kgraph ingest <path>` | Ingest one document file, printing progress |
//!
//! All configuration is environment-resolved (`LLM_MODEL_TYPE`,
//! `LLM_MODEL_NAME`, `LLM_URL`, `API_KEY`, `KGRAPH_BIND`, ...). See the
//! crate documentation for the full surface.
//!
//! ## Exit codes (`kgraph ingest`)
//!
//! | Code | Meaning |
//! |------|---------|
//! | `0` | document ingested |
//! | `1` | file not found, or the pipeline reported failure |
//! | `2` | missing required argument (clap) |

use clap::{Parser, Subcommand, ValueEnum};

use kgraph_mcp::config::Config;
use kgraph_mcp::ingest::{run_ingestion, IngestOutcome};
use kgraph_mcp::progress::ProgressMode;
use kgraph_mcp::{select_backend, server};

#[derive(Parser)]
#[command(
    name = "kgraph",
    about = "KGraph — knowledge-graph retrieval over MCP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP streamable-HTTP server.
    ///
    /// Selects the configured backend first and refuses to start on an
    /// unsupported or incomplete configuration.
    Serve,

    /// Ingest a document file into the knowledge graph.
    ///
    /// Progress events print incrementally; the command forces
    /// reprocessing unless `--no-force` is given.
    Ingest {
        /// Path to the document file to ingest.
        path: String,

        /// Respect the backend's dedup shortcut instead of forcing.
        #[arg(long)]
        no_force: bool,

        /// Progress output style.
        #[arg(long, value_enum, default_value = "human")]
        progress: ProgressArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgressArg {
    Human,
    Json,
    Off,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
            ProgressArg::Off => ProgressMode::Off,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = Config::from_env()?;
            server::run_server(&config).await?;
        }
        Commands::Ingest {
            path,
            no_force,
            progress,
        } => {
            let config = Config::from_env()?;
            let backend = select_backend(&config)?;

            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                eprintln!("ERROR: file not found: {}", path);
                std::process::exit(1);
            }

            let notifier = ProgressMode::from(progress).notifier();
            match run_ingestion(backend.as_ref(), &path, !no_force, notifier.as_ref()).await {
                IngestOutcome::Completed => println!("DONE: {}", path),
                IngestOutcome::Failed => {
                    eprintln!("ERROR: failed to process document: {}", path);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
