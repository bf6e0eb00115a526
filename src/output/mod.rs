//! Output: JSON Lines records and the human-readable run summary

pub mod summary;

pub use summary::SummaryFormatter;

use crate::error::{ErrorContext, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one compact JSON object per line
pub struct JsonLinesWriter {
    writer: Box<dyn Write>,
    destination: String,
    lines: usize,
}

impl JsonLinesWriter {
    /// Write to standard output
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(BufWriter::new(io::stdout())), "stdout")
    }

    /// Create (or truncate) `path` and write to it
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self::from_writer(Box::new(BufWriter::new(file)), &path.display().to_string()))
    }

    /// File when a path is given, standard output otherwise
    pub fn open(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::create(path),
            None => Ok(Self::stdout()),
        }
    }

    pub fn from_writer(writer: Box<dyn Write>, destination: &str) -> Self {
        Self {
            writer,
            destination: destination.to_string(),
            lines: 0,
        }
    }

    /// Append one record as a single line
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer
            .write_all(b"\n")
            .with_context(|| format!("Failed to write to {}", self.destination))?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.destination))
    }
}
