//! # Clause Harness CLI (`clh`)
//!
//! The `clh` binary classifies, analyzes, and compares legal documents
//! through an LLM gateway.
//!
//! ## Usage
//!
//! ```bash
//! clh --config ./config/clh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clh classify <file>` | Classify a document into a top-level category |
//! | `clh analyze <file>` | Run the category-specific clause extraction workflow |
//! | `clh compare <file1> <file2>` | Run the hybrid document comparison |
//!
//! ## Examples
//!
//! ```bash
//! # Classify a document
//! clh classify notice.txt
//!
//! # Analyze with an explicit category, machine-readable output
//! clh analyze contract.txt --category contracts --json
//!
//! # Compare two versions of a lease
//! clh compare lease_v1.txt lease_v2.txt --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use clause_harness::analyze::{run_analyze, run_classify};
use clause_harness::config;
use clause_harness::gateway::create_client;
use clause_harness::hybrid::run_compare;
use clause_harness::models::DocumentCategory;
use clause_harness::progress::{ProgressReporter, SilentProgress, StderrProgress};

/// Clause Harness CLI — LLM-driven classification, analysis, and
/// comparison of legal documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/clh.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "clh",
    about = "Clause Harness — LLM-driven classification, analysis, and comparison of legal documents",
    version,
    long_about = "Clause Harness chunks a legal document, classifies it by per-chunk plurality \
    vote, extracts clauses through a category-specific workflow, and can compare two documents \
    through a hybrid holistic-plus-granular pipeline."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/clh.toml`. Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/clh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Classify a document into a top-level category.
    ///
    /// Chunks the document and classifies each chunk independently; the
    /// document takes the category with the most votes.
    Classify {
        /// Path to the document (plain text).
        file: PathBuf,

        /// Emit the result as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Run the category-specific clause extraction workflow.
    ///
    /// Classifies the document first unless `--category` is given, then
    /// runs the matching workflow: clause extraction, sub-classification,
    /// attribute extraction, explanations, and a summary.
    Analyze {
        /// Path to the document (plain text).
        file: PathBuf,

        /// Skip classification and force a category: contracts, litigation,
        /// regulatory, corporate, property, government, or personal.
        #[arg(long)]
        category: Option<DocumentCategory>,

        /// Emit the full analysis as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Compare two documents through the hybrid pipeline.
    ///
    /// Runs holistic summaries, chunk-level matching with detailed
    /// comparisons, a synthesis step, and a prose executive summary.
    Compare {
        /// Path to the first document (plain text).
        file1: PathBuf,

        /// Path to the second document (plain text).
        file2: PathBuf,

        /// Emit the full result as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Built-in defaults when the config file is absent; an existing but
    // invalid file is still an error.
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    let client = create_client(&cfg.gateway)?;

    match cli.command {
        Commands::Classify { file, json } => {
            run_classify(client, &cfg, &file, json).await?;
        }
        Commands::Analyze {
            file,
            category,
            json,
        } => {
            let progress = reporter(json);
            run_analyze(client, &cfg, progress.as_ref(), &file, category, json).await?;
        }
        Commands::Compare { file1, file2, json } => {
            let progress = reporter(json);
            run_compare(client, &cfg, progress.as_ref(), &file1, &file2, json).await?;
        }
    }

    Ok(())
}

/// Progress goes to stderr; JSON mode keeps the terminal quiet so piped
/// output stays clean even when stderr is merged.
fn reporter(json: bool) -> Box<dyn ProgressReporter> {
    if json {
        Box::new(SilentProgress)
    } else {
        Box::new(StderrProgress)
    }
}
