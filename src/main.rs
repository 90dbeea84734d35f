//! study-ingest CLI
//!
//! Commands:
//!   detect   - Print the detected file type
//!   extract  - Print cleaned document text
//!   metadata - Print document metadata as JSON
//!   chunk    - Split a document into chunks
//!   process  - Run the full pipeline and write JSONL
//!   config   - Show or initialize the configuration file

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use study_ingest::{
    build_provider, clean_text, detect_file_type, extract_metadata, extractor_for, ChunkPolicy,
    Config, EmbeddingBackend, IngestPipeline, JsonlWriter, PathFilter, ProgressTracker,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "study-ingest")]
#[command(about = "Turn study documents into summarized, embedded chunks")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.study-ingest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings only, no progress bar
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the file type (pdf, docx, txt)
    Detect {
        path: PathBuf,
    },

    /// Print the cleaned text of a document
    Extract {
        path: PathBuf,
    },

    /// Print document metadata as JSON
    Metadata {
        path: PathBuf,
    },

    /// Split a document into chunks
    Chunk {
        path: PathBuf,

        /// Maximum chunk size in chars
        #[arg(short, long)]
        size: Option<usize>,

        /// Chunk boundary policy
        #[arg(short, long, value_enum)]
        policy: Option<ChunkPolicy>,

        /// Overlap between sentence chunks in chars
        #[arg(long)]
        overlap: Option<usize>,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process a file or directory into JSONL chunk records
    Process {
        /// File or directory to process
        path: PathBuf,

        /// Source ID (defaults to each file's stem)
        #[arg(short, long)]
        source: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip embeddings
        #[arg(long)]
        no_embed: bool,

        /// Only process files matching this glob (repeatable)
        #[arg(short, long)]
        include: Vec<String>,
    },

    /// Show the effective configuration, or write the default config file
    Config {
        /// Write the default configuration
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "study_ingest=debug"
    } else if quiet {
        "study_ingest=warn"
    } else {
        "study_ingest=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect { path } => {
            let file_type = detect_file_type(&path)?;
            println!("{}", file_type);
        }

        Commands::Extract { path } => {
            let cleaned = load_text(&path)?;
            println!("{}", cleaned);
        }

        Commands::Metadata { path } => {
            let file_type = detect_file_type(&path)?;
            let extracted = extractor_for(file_type).extract(&path)?;
            let cleaned = clean_text(&extracted.text);
            let metadata = extract_metadata(&path, file_type, &extracted, &cleaned)?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }

        Commands::Chunk { path, size, policy, overlap, json } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let policy = policy.unwrap_or(config.chunking.policy);
            let size = size.unwrap_or(config.chunking.chunk_size);
            let overlap = overlap.unwrap_or(config.chunking.overlap);

            let cleaned = load_text(&path)?;
            let chunks = policy.build(size, overlap).chunk(&cleaned);

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for chunk in &chunks {
                    println!(
                        "{} chars {}..{} ({} chars)",
                        format!("[{}]", chunk.index).cyan().bold(),
                        chunk.char_start,
                        chunk.char_end,
                        chunk.char_len()
                    );
                    println!("{}\n", chunk.content);
                }
                eprintln!(
                    "{} {} chunks ({} policy, size {})",
                    "Done:".green().bold(),
                    chunks.len(),
                    policy.name(),
                    size
                );
            }
        }

        Commands::Process { path, source, output, no_embed, include } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if no_embed {
                config.embedding.backend = EmbeddingBackend::Disabled;
            }

            let filter = PathFilter::new(&include)?;
            let embedder = build_provider(&config.embedding, !cli.quiet).await?;
            let pipeline = IngestPipeline::from_config(&config, embedder);

            let mut progress = if cli.quiet {
                ProgressTracker::quiet(0)
            } else {
                ProgressTracker::new(0)
            };
            let report = pipeline
                .process_path(&path, source.as_deref(), &filter, &mut progress)
                .await?;

            let stats = match &output {
                Some(file) => {
                    let mut writer = JsonlWriter::create(file)?;
                    for document in &report.documents {
                        writer.write_document(document)?;
                    }
                    writer.finish()?
                }
                None => {
                    let mut writer = JsonlWriter::new(std::io::stdout().lock());
                    for document in &report.documents {
                        writer.write_document(document)?;
                    }
                    writer.finish()?
                }
            };

            if !cli.quiet {
                eprintln!();
                eprintln!("{}", "Processing complete!".green().bold());
                eprintln!("  Documents: {}", stats.documents_written);
                eprintln!("  Chunks: {}", stats.chunks_written);
                if !report.skipped.is_empty() {
                    eprintln!("  Skipped: {}", report.skipped.len());
                }
                if let Some(file) = &output {
                    eprintln!("  Output: {}", file.display());
                }
            }
            for failure in &report.failures {
                eprintln!(
                    "  {} {}: {:#}",
                    "Failed".red().bold(),
                    failure.path.display(),
                    failure.error
                );
            }

            if !report.is_success() {
                anyhow::bail!("{} of {} files failed", report.failures.len(), report.failures.len() + report.documents.len());
            }
        }

        Commands::Config { init, force } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::path()?,
            };

            if init {
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save_to(&path)?;
                println!("{} Wrote {}", "✓".green(), path.display());
            } else {
                let (config, source) = match Config::load_at(&path)? {
                    Some(config) => (config, path.display().to_string()),
                    None => (Config::default(), format!("defaults ({} not found)", path.display())),
                };
                println!("{}", format!("# {}", source).dimmed());
                print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
                std::io::stdout().flush()?;
            }
        }
    }

    Ok(())
}

/// Extract and clean a document
fn load_text(path: &Path) -> Result<String> {
    let file_type = detect_file_type(path)?;
    let extracted = extractor_for(file_type)
        .extract(path)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    Ok(clean_text(&extracted.text))
}
