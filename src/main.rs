//! # Quizsmith CLI (`qsmith`)
//!
//! Ingests content (pages, URLs, selections, PDFs, typed topics) into the
//! normalized, chunked record the quiz generator consumes, optionally
//! summarizes it chunk by chunk, and repairs raw model completions into
//! validated quiz JSON.
//!
//! ## Usage
//!
//! ```bash
//! qsmith --config ./config/qsmith.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qsmith ingest page <file> --url <u>` | Normalize a saved HTML page |
//! | `qsmith ingest url <url>` | Fetch and normalize a page |
//! | `qsmith ingest selection <file>` | Normalize highlighted text |
//! | `qsmith ingest pdf <file>` | Extract and normalize a PDF |
//! | `qsmith ingest manual --topic <t>` | Normalize a typed topic |
//! | `qsmith repair <file>` | Recover, repair, and validate a quiz completion |
//! | `qsmith completions <shell>` | Print shell completions |

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use quizsmith::config;
use quizsmith::ingest::{self, IngestSource};
use quizsmith::logging;
use quizsmith::progress::ProgressMode;
use quizsmith::repair_cmd;

/// Quizsmith CLI: content ingestion and quiz repair for AI quiz generation.
#[derive(Parser)]
#[command(name = "qsmith", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: when the file does not exist, built-in defaults are used
    /// and the LLM is disabled.
    #[arg(long, global = true, default_value = "./config/qsmith.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a source into clean text and chunks.
    ///
    /// Prints the extracted source as JSON on stdout. With `--summarize`,
    /// each chunk is summarized by the configured LLM; failed chunks fall
    /// back to their truncated text.
    Ingest {
        #[command(subcommand)]
        kind: IngestKind,

        /// Summarize chunks with the configured `[llm]`.
        #[arg(long, global = true)]
        summarize: bool,

        /// Progress on stderr: off, human, or json. Defaults to human on a TTY.
        #[arg(long, global = true, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Recover and repair a raw model completion into a validated quiz.
    ///
    /// Reads the completion from a file (`-` for stdin) and prints the
    /// quiz JSON on stdout.
    Repair {
        /// Completion file, or `-` for stdin.
        path: PathBuf,

        /// Ask the configured `[llm]` to fix JSON that cannot be recovered locally.
        #[arg(long)]
        llm_repair: bool,
    },

    /// Print shell completion script.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum IngestKind {
    /// A saved HTML page.
    Page {
        path: PathBuf,
        /// URL the page was loaded from.
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Fetch a page over HTTP(S).
    Url { url: String },
    /// Highlighted text saved to a file.
    Selection {
        path: PathBuf,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// A PDF with a text layer.
    Pdf { path: PathBuf },
    /// A typed topic with optional context.
    Manual {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        context: Option<String>,
    },
}

impl From<IngestKind> for IngestSource {
    fn from(kind: IngestKind) -> Self {
        match kind {
            IngestKind::Page { path, url, title } => IngestSource::Page { path, url, title },
            IngestKind::Url { url } => IngestSource::Url { url },
            IngestKind::Selection { path, url, title } => {
                IngestSource::Selection { path, url, title }
            }
            IngestKind::Pdf { path } => IngestSource::Pdf { path },
            IngestKind::Manual { topic, context } => IngestSource::Manual { topic, context },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "qsmith", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_minimal(&cli.config)?;
    logging::init_tracing(&cfg.logging, cli.verbose);

    match cli.command {
        Commands::Ingest {
            kind,
            summarize,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_ingest(&cfg, kind.into(), summarize, progress).await?;
        }
        Commands::Repair { path, llm_repair } => {
            repair_cmd::run_repair(&cfg, &path, llm_repair).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
