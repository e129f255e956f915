//! Row-oriented source log reader
//!
//! The source log is an append-only CSV file written by the monitoring
//! process: a header row, a time column first (its original header name
//! is arbitrary and semantically means "time"), then one column per
//! channel, one row per sample.

use std::path::{Path, PathBuf};

use crate::error::{Result, WavescopeError};
use crate::types::LogRow;

/// Reader for the append-only CSV source log
#[derive(Debug, Clone)]
pub struct SourceLog {
    path: PathBuf,
}

/// Everything read from the source in one pass
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// Channel names (source columns 1..N, in order)
    pub channels: Vec<String>,
    /// All parsed rows, in file order
    pub rows: Vec<LogRow>,
}

impl SourceSnapshot {
    /// The maximum time present in the snapshot
    pub fn max_time(&self) -> Option<f64> {
        self.rows.iter().map(|r| r.time).fold(None, |acc, t| {
            Some(match acc {
                Some(m) if m >= t => m,
                _ => t,
            })
        })
    }
}

impl SourceLog {
    /// Create a reader for the log at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the source file currently exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the full source log
    ///
    /// The whole file is re-read on every call; incremental selection
    /// happens on the parsed rows (`time > mark`), not on file bytes.
    pub fn read_all(&self) -> Result<SourceSnapshot> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(WavescopeError::Source(format!(
                "{}: header row has no columns",
                self.path.display()
            )));
        }
        let channels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            // Ragged rows surface as csv errors here; the reader is strict.
            let record = record?;
            let mut fields = record.iter();
            let time = parse_field(fields.next().unwrap_or(""), &self.path, line)?;
            let values = fields
                .map(|field| parse_field(field, &self.path, line))
                .collect::<Result<Vec<f64>>>()?;
            rows.push(LogRow::new(time, values));
        }

        Ok(SourceSnapshot { channels, rows })
    }

    /// Read only rows with `time > mark`
    ///
    /// Cost is still O(source size); only the returned rows are bounded.
    pub fn read_after(&self, mark: f64) -> Result<SourceSnapshot> {
        let mut snapshot = self.read_all()?;
        snapshot.rows.retain(|row| row.time > mark);
        Ok(snapshot)
    }
}

fn parse_field(field: &str, path: &Path, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| {
        WavescopeError::Source(format!(
            "{}: row {} has non-numeric field {:?}",
            path.display(),
            line + 2,
            field
        ))
    })
}
