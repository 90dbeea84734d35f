//! JSONL writer for processed chunks
//!
//! One `ProcessedChunk` JSON object per line, to a file or stdout.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::ProcessedDocument;

/// Statistics from a write operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of documents written
    pub documents_written: usize,
    /// Number of chunks written
    pub chunks_written: usize,
}

impl WriteStats {
    /// Merge another WriteStats into this one
    pub fn merge(&mut self, other: WriteStats) {
        self.documents_written += other.documents_written;
        self.chunks_written += other.chunks_written;
    }
}

/// Writes processed documents as JSON lines
pub struct JsonlWriter<W: Write> {
    out: W,
    stats: WriteStats,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stats: WriteStats::default(),
        }
    }

    /// Write every chunk of `document`, one line each
    pub fn write_document(&mut self, document: &ProcessedDocument) -> Result<WriteStats> {
        for chunk in &document.chunks {
            serde_json::to_writer(&mut self.out, chunk)
                .with_context(|| format!("Failed to serialize chunk {} of {}", chunk.index, document.metadata.file_name))?;
            self.out.write_all(b"\n").context("Failed to write output")?;
        }

        let stats = WriteStats {
            documents_written: 1,
            chunks_written: document.chunks.len(),
        };
        self.stats.merge(stats.clone());
        Ok(stats)
    }

    /// Flush and return the totals
    pub fn finish(mut self) -> Result<WriteStats> {
        self.out.flush().context("Failed to flush output")?;
        Ok(self.stats)
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush().context("Failed to flush output")?;
        Ok(self.out)
    }
}

impl JsonlWriter<BufWriter<File>> {
    /// Create (or truncate) `path`, creating parent directories as needed
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}
