//! # Sensiscan CLI (`senscan`)
//!
//! The `senscan` binary scores documents and web pages against a weighted
//! glossary of sensitive terms.
//!
//! ## Usage
//!
//! ```bash
//! senscan --config ./config/senscan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `senscan analyze <FILES>...` | Score local documents (pdf, docx, xlsx, pptx, txt) |
//! | `senscan urls <URLS>...` | Fetch and score web pages |
//! | `senscan glossary` | Show glossary statistics |
//! | `senscan serve` | Start the HTTP analysis API |
//!
//! ## Examples
//!
//! ```bash
//! # Score two documents, suppressing one known-benign phrase
//! senscan analyze report.pdf notes.docx --ignore "annual equity statement"
//!
//! # Score a comma-separated URL list with a newline-delimited ignore file
//! senscan urls "https://example.com/a, https://example.com/b" \
//!     --ignore-file ./ignore.txt
//!
//! # Start the HTTP API for the upload form
//! senscan serve --config ./config/senscan.toml
//! ```

mod batch;
mod config;
mod extract;
mod fetch;
mod glossary;
mod mask;
mod matcher;
mod score;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::batch::{parse_url_list, Engine, Source};
use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::glossary::Glossary;

/// Sensiscan — weighted keyword sensitivity scoring for documents and web
/// pages.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/senscan.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "senscan",
    about = "Score documents and web pages against a weighted sensitive-term glossary",
    version,
    long_about = "Sensiscan extracts text from uploaded documents (PDF, Word, spreadsheets, \
    slides, plain text) or fetched web pages, removes caller-supplied verbatim ignore phrases, \
    matches the remainder against a weighted keyword glossary, and reports per-section, \
    per-document, and batch-level sensitivity scores."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/senscan.toml`. Glossary location, matching
    /// mode, concurrency, fetch, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/senscan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Score local document files.
    ///
    /// Each file is extracted into sections (PDF pages, spreadsheet sheets,
    /// slides, or a single whole-document section), masked, matched, and
    /// aggregated. An unsupported or unreadable file becomes that file's
    /// error entry without aborting the rest of the batch.
    Analyze {
        /// Files to score.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Verbatim phrase to ignore during matching. Repeatable.
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// File with newline-delimited ignore phrases.
        #[arg(long)]
        ignore_file: Option<PathBuf>,
    },

    /// Fetch and score web pages.
    ///
    /// Arguments may each contain comma-separated URL lists. Pages from
    /// known social-media hosts additionally report the post's publication
    /// timestamp when the markup carries one.
    Urls {
        /// URLs to score (comma-separated lists accepted).
        #[arg(required = true)]
        urls: Vec<String>,

        /// Verbatim phrase to ignore during matching. Repeatable.
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// File with newline-delimited ignore phrases.
        #[arg(long)]
        ignore_file: Option<PathBuf>,
    },

    /// Show glossary statistics.
    ///
    /// Loads the configured glossary and prints the entry count, the weight
    /// range, and the heaviest terms. Useful for verifying the glossary file
    /// before running an analysis.
    Glossary,

    /// Start the HTTP analysis API.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// upload/URL analysis endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            files,
            ignore,
            ignore_file,
        } => {
            let engine = build_engine(&cfg)?;
            let phrases = collect_ignore_phrases(ignore, ignore_file)?;
            let sources = files.into_iter().map(file_source).collect();
            let result = engine.run(sources, phrases).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Urls {
            urls,
            ignore,
            ignore_file,
        } => {
            let url_list = parse_url_list(&urls.join(","));
            if url_list.is_empty() {
                anyhow::bail!("no URLs provided");
            }
            let engine = build_engine(&cfg)?;
            let phrases = collect_ignore_phrases(ignore, ignore_file)?;
            let sources = url_list.into_iter().map(|url| Source::Url { url }).collect();
            let result = engine.run(sources, phrases).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Glossary => {
            let glossary = Glossary::load(&cfg.glossary.path)?;
            print_glossary_stats(&glossary);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn build_engine(cfg: &Config) -> Result<Engine> {
    let glossary = Glossary::load(&cfg.glossary.path)?;
    let fetcher = Arc::new(HttpFetcher::new(
        cfg.fetch.timeout_secs,
        &cfg.fetch.user_agent,
    )?);
    Engine::new(
        &glossary,
        cfg.matching.mode,
        fetcher,
        cfg.batch.max_concurrency,
    )
}

/// Merge `--ignore` flags with the optional `--ignore-file` block, keeping
/// flag order first (phrases apply in the order given).
fn collect_ignore_phrases(flags: Vec<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    let mut phrases: Vec<String> = flags
        .iter()
        .flat_map(|f| mask::parse_ignore_phrases(f))
        .collect();
    if let Some(path) = file {
        let block = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ignore file: {}", path.display()))?;
        phrases.extend(mask::parse_ignore_phrases(&block));
    }
    Ok(phrases)
}

fn file_source(path: PathBuf) -> Source {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Source::File { name, path }
}

fn print_glossary_stats(glossary: &Glossary) {
    println!("glossary terms: {}", glossary.len());
    if glossary.is_empty() {
        return;
    }

    let weights: Vec<f64> = glossary.entries().iter().map(|e| e.weight).collect();
    let min = weights.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = weights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    println!("weight range: {} to {}", min, max);

    let mut heaviest: Vec<_> = glossary.entries().to_vec();
    heaviest.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!();
    println!("{:<32} {:>8}", "TERM", "WEIGHT");
    for entry in heaviest.iter().take(10) {
        println!("{:<32} {:>8}", entry.term, entry.weight);
    }
}
