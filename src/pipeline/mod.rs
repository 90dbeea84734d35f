//! Ingestion pipeline
//!
//! Turns files into [`ProcessedDocument`]s:
//!
//! ```text
//! detect -> extract -> clean -> metadata -> chunk -> summarize -> embed
//! ```
//!
//! Everything up to summarizing is synchronous and runs on the blocking
//! pool; embedding goes through the async [`EmbeddingProvider`]. Directory
//! ingestion overlaps up to `concurrency` files and keeps walk order.

pub mod progress;
pub mod writer;

pub use progress::ProgressTracker;
pub use writer::{JsonlWriter, WriteStats};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunking::{Chunker, FixedSizeChunker, TextChunk};
use crate::clean::clean_text;
use crate::config::Config;
use crate::detect::{detect_file_type, is_supported};
use crate::embed::{embed_all, EmbeddingProvider};
use crate::extract::extractor_for;
use crate::metadata::{extract_metadata, DocumentMetadata};
use crate::summary::{extractive_summary, DEFAULT_SUMMARY_CHARS};
use crate::types::{ProcessedChunk, ProcessedDocument};

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_CONCURRENCY: usize = 2;

/// Include globs for directory ingestion. An empty filter accepts every file.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<glob::Pattern>,
}

impl PathFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let include = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref())
                    .with_context(|| format!("Invalid include pattern '{}'", p.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { include })
    }

    /// Match against the path relative to the walk root, or the bare file name
    pub fn matches(&self, path: &Path, root: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        let file_name = path.file_name().map(Path::new).unwrap_or(relative);
        self.include
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(file_name))
    }
}

/// Why a file found during the walk was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedType,
    Excluded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A file that failed to process
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of a [`IngestPipeline::process_path`] run
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<ProcessedDocument>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FileFailure>,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ingestion pipeline for single files and directory trees
pub struct IngestPipeline {
    chunker: Arc<dyn Chunker>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    batch_size: usize,
    summary_max_chars: usize,
    concurrency: usize,
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(Arc::new(FixedSizeChunker::default()), None)
    }
}

impl IngestPipeline {
    /// Create a pipeline; `embedder = None` leaves chunk embeddings empty
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self {
            chunker,
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            summary_max_chars: DEFAULT_SUMMARY_CHARS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Create a pipeline from the chunking, summary and pipeline config sections
    pub fn from_config(config: &Config, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        let chunker: Arc<dyn Chunker> = Arc::from(
            config
                .chunking
                .policy
                .build(config.chunking.chunk_size, config.chunking.overlap),
        );
        Self::new(chunker, embedder)
            .with_batch_size(config.embedding.batch_size)
            .with_summary_chars(config.summary.max_chars)
            .with_concurrency(config.pipeline.concurrency)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_summary_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Detect, extract, clean, describe, chunk and summarize one file.
    /// Chunk embeddings are left empty.
    pub fn prepare_file(&self, path: &Path, source_id: Option<&str>) -> Result<ProcessedDocument> {
        prepare(path, source_id, self.chunker.as_ref(), self.summary_max_chars)
    }

    /// [`Self::prepare_file`] plus embeddings
    pub async fn process_file(&self, path: &Path, source_id: Option<&str>) -> Result<ProcessedDocument> {
        let owned_path = path.to_path_buf();
        let owned_source = source_id.map(str::to_string);
        let chunker = Arc::clone(&self.chunker);
        let summary_max_chars = self.summary_max_chars;

        let mut document = tokio::task::spawn_blocking(move || {
            prepare(&owned_path, owned_source.as_deref(), chunker.as_ref(), summary_max_chars)
        })
        .await
        .context("Document preparation task panicked")??;

        if let Some(embedder) = &self.embedder {
            self.embed_document(embedder.as_ref(), &mut document)
                .await
                .with_context(|| format!("Failed to embed {}", path.display()))?;
        }

        Ok(document)
    }

    /// Process a single file, or every supported file under a directory.
    ///
    /// Per-file failures are collected in the report instead of aborting the
    /// run. Documents come back in walk order.
    pub async fn process_path(
        &self,
        path: &Path,
        source_id: Option<&str>,
        filter: &PathFilter,
        progress: &mut ProgressTracker,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        let files = if path.is_dir() {
            let walk = collect_files(path, filter);
            report.skipped = walk.skipped;
            report.failures = walk.failures;
            walk.files
        } else if path.exists() {
            vec![path.to_path_buf()]
        } else {
            anyhow::bail!("Path not found: {}", path.display());
        };

        info!(files = files.len(), skipped = report.skipped.len(), "starting ingestion");
        progress.set_total(files.len());

        let names: Vec<String> = files.iter().map(|f| display_name(f)).collect();
        let mut results = stream::iter(files)
            .map(|file| async move {
                let result = self.process_file(&file, source_id).await;
                (file, result)
            })
            .buffered(self.concurrency);

        for name in &names {
            progress.set_current(name);
            let Some((file, result)) = results.next().await else {
                break;
            };
            match result {
                Ok(document) => {
                    debug!(file = %file.display(), chunks = document.chunks.len(), "processed");
                    progress.document_done(document.chunks.len());
                    report.documents.push(document);
                }
                Err(error) => {
                    warn!(file = %file.display(), error = %format!("{:#}", error), "failed to process file");
                    progress.document_failed();
                    report.failures.push(FileFailure { path: file, error });
                }
            }
        }

        progress.complete();
        Ok(report)
    }

    async fn embed_document(
        &self,
        embedder: &dyn EmbeddingProvider,
        document: &mut ProcessedDocument,
    ) -> Result<()> {
        let texts: Vec<String> = document.chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embed_all(embedder, &texts, self.batch_size).await?;

        for (chunk, embedding) in document.chunks.iter_mut().zip(vectors) {
            chunk.embedding = embedding;
            chunk
                .metadata
                .insert("embedding_model".to_string(), embedder.name().to_string());
        }
        Ok(())
    }
}

fn prepare(
    path: &Path,
    source_id: Option<&str>,
    chunker: &dyn Chunker,
    summary_max_chars: usize,
) -> Result<ProcessedDocument> {
    let file_type = detect_file_type(path)?;
    let extracted = extractor_for(file_type)
        .extract(path)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    let cleaned = clean_text(&extracted.text);
    let metadata = extract_metadata(path, file_type, &extracted, &cleaned)?;

    let source_id = source_id
        .map(str::to_string)
        .unwrap_or_else(|| default_source_id(path));

    let text_chunks = chunker.chunk(&cleaned);
    if text_chunks.is_empty() {
        warn!(file = %path.display(), "no text extracted");
    }
    let chunks = build_chunks(&source_id, &metadata, chunker.name(), text_chunks, summary_max_chars);

    Ok(ProcessedDocument {
        source_id,
        metadata,
        chunks,
    })
}

fn build_chunks(
    source_id: &str,
    metadata: &DocumentMetadata,
    policy: &str,
    text_chunks: Vec<TextChunk>,
    summary_max_chars: usize,
) -> Vec<ProcessedChunk> {
    let total = text_chunks.len();
    let document_map = metadata.to_map();

    text_chunks
        .into_iter()
        .map(|chunk| {
            let title = if total > 1 {
                format!("{} (part {} of {})", metadata.title, chunk.index + 1, total)
            } else {
                metadata.title.clone()
            };

            let mut map: BTreeMap<String, String> = document_map.clone();
            map.insert("chunk_index".to_string(), chunk.index.to_string());
            map.insert("chunk_count".to_string(), total.to_string());
            map.insert("char_start".to_string(), chunk.char_start.to_string());
            map.insert("char_end".to_string(), chunk.char_end.to_string());
            map.insert("chunk_policy".to_string(), policy.to_string());

            ProcessedChunk {
                source_id: source_id.to_string(),
                index: chunk.index,
                title,
                summary: extractive_summary(&chunk.content, summary_max_chars),
                content: chunk.content,
                metadata: map,
                embedding: Vec::new(),
            }
        })
        .collect()
}

/// Files found by [`collect_files`]
#[derive(Debug, Default)]
pub struct CollectedFiles {
    /// Supported files to process, in file-name order
    pub files: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    /// Entries the walk could not read, such as symlink loops
    pub failures: Vec<FileFailure>,
}

/// Supported files under `root` in file-name order, plus the files passed over.
/// Hidden files and directories are not visited. Unreadable entries are
/// recorded as failures and the walk continues.
pub fn collect_files(root: &Path, filter: &PathFilter) -> CollectedFiles {
    let mut collected = CollectedFiles::default();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                collected.failures.push(FileFailure {
                    path,
                    error: anyhow::Error::new(err).context("Failed to walk directory"),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();

        if !is_supported(&path) {
            collected.skipped.push(SkippedFile {
                path,
                reason: SkipReason::UnsupportedType,
            });
        } else if !filter.matches(&path, root) {
            collected.skipped.push(SkippedFile {
                path,
                reason: SkipReason::Excluded,
            });
        } else {
            collected.files.push(path);
        }
    }

    collected
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn default_source_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
