//! Progress Tracker for ingestion pipeline
//!
//! Drives an indicatif progress bar on stderr while files are processed.

use indicatif::{ProgressBar, ProgressStyle};

/// Tracks and displays progress during ingestion
pub struct ProgressTracker {
    bar: ProgressBar,
    /// Number of documents processed
    processed_docs: usize,
    /// Number of chunks produced
    processed_chunks: usize,
    /// Number of files that failed
    failed_docs: usize,
}

impl ProgressTracker {
    /// Create a new progress tracker drawing to stderr
    pub fn new(total_docs: usize) -> Self {
        let bar = ProgressBar::new(total_docs as u64);
        let style = ProgressStyle::default_bar()
            .template("  {msg:<32!} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid progress bar template");
                ProgressStyle::default_bar()
            })
            .progress_chars("=>-");
        bar.set_style(style);
        Self::with_bar(bar)
    }

    /// Create a quiet progress tracker (no output)
    pub fn quiet(total_docs: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_docs as u64);
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            processed_docs: 0,
            processed_chunks: 0,
            failed_docs: 0,
        }
    }

    /// Reset the total once the file list is known
    pub fn set_total(&mut self, total_docs: usize) {
        self.bar.set_length(total_docs as u64);
    }

    /// Show the file currently being processed
    pub fn set_current(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    /// Record a finished document and its chunk count
    pub fn document_done(&mut self, chunks: usize) {
        self.processed_docs += 1;
        self.processed_chunks += chunks;
        self.bar.inc(1);
    }

    /// Record a failed document
    pub fn document_failed(&mut self) {
        self.failed_docs += 1;
        self.bar.inc(1);
    }

    /// Get the number of processed documents
    pub fn docs_processed(&self) -> usize {
        self.processed_docs
    }

    /// Get the number of produced chunks
    pub fn chunks_processed(&self) -> usize {
        self.processed_chunks
    }

    /// Get the number of failed documents
    pub fn docs_failed(&self) -> usize {
        self.failed_docs
    }

    /// Finish the bar with a completion message
    pub fn complete(&self) {
        self.bar.finish_with_message(format!(
            "{} docs, {} chunks, {} failed",
            self.processed_docs, self.processed_chunks, self.failed_docs
        ));
    }
}
