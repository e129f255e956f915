//! Incremental columnar cache for the source log
//!
//! This module owns the durable side of the data core: a Parquet file
//! mirroring every row ingested from the CSV source log so far, plus a
//! high-water-mark file recording the maximum time already migrated.
//!
//! # Lifecycle
//!
//! - [`ColumnarCache::bootstrap`] - first launch: read the entire source,
//!   rename its first column to `time`, write the full Parquet cache and
//!   the mark. Skipped when both files already exist.
//! - [`ColumnarCache::refresh`] - every tick: re-read the source, select
//!   rows with `time > mark`, append them (read existing batches, write a
//!   fresh file, atomically rename) and advance the mark. Best-effort: any
//!   failure is logged and leaves the cache and mark unchanged.
//!
//! # Atomicity
//!
//! Both the cache and the mark are published with write-to-temp-then-
//! rename, so a reader never observes a partially applied update and a
//! crash mid-refresh cannot corrupt the cache.
//!
//! # Cost model
//!
//! `refresh` re-reads the whole source file on every call; the O(source)
//! cost per tick is accepted and documented rather than hidden.

pub mod source_log;

pub use source_log::{SourceLog, SourceSnapshot};

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info, warn};

use crate::error::{Result, ResultExt, WavescopeError};
use crate::types::LogRow;

/// Canonical name of the time column inside the cache
///
/// The source's first column keeps whatever header the monitoring process
/// wrote; it is renamed on ingestion.
pub const TIME_COLUMN: &str = "time";

/// Default cache file name inside the cache directory
pub const DEFAULT_CACHE_FILE: &str = "monitor_log.parquet";

/// Default high-water-mark file name inside the cache directory
pub const DEFAULT_MARK_FILE: &str = "monitor_log.last_time";

/// Columnar on-disk cache mirroring a growing row-oriented source log
///
/// Single-writer by construction: all refreshes run synchronously on the
/// session thread.
#[derive(Debug)]
pub struct ColumnarCache {
    source: SourceLog,
    cache_path: PathBuf,
    mark_path: PathBuf,
    /// Maximum time already migrated into the cache; `None` until a
    /// bootstrap has succeeded.
    high_water: Option<f64>,
}

impl ColumnarCache {
    /// Create a cache over `source_path` with explicit cache/mark paths
    ///
    /// No file is touched until [`bootstrap`](Self::bootstrap) or
    /// [`refresh`](Self::refresh) runs.
    pub fn new(
        source_path: impl Into<PathBuf>,
        cache_path: impl Into<PathBuf>,
        mark_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: SourceLog::new(source_path),
            cache_path: cache_path.into(),
            mark_path: mark_path.into(),
            high_water: None,
        }
    }

    /// Create a cache with the default file names inside `cache_dir`
    pub fn in_dir(source_path: impl Into<PathBuf>, cache_dir: impl AsRef<Path>) -> Self {
        let dir = cache_dir.as_ref();
        Self::new(
            source_path,
            dir.join(DEFAULT_CACHE_FILE),
            dir.join(DEFAULT_MARK_FILE),
        )
    }

    /// Path of the Parquet cache file
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Path of the high-water-mark file
    pub fn mark_path(&self) -> &Path {
        &self.mark_path
    }

    /// The source log this cache mirrors
    pub fn source(&self) -> &SourceLog {
        &self.source
    }

    /// The maximum time already migrated, if bootstrapped
    pub fn high_water_mark(&self) -> Option<f64> {
        self.high_water
    }

    /// Whether a bootstrap has succeeded (initially or on a later retry)
    pub fn is_bootstrapped(&self) -> bool {
        self.high_water.is_some()
    }

    /// Channel names stored in the cache (everything except `time`)
    pub fn channels(&self) -> Result<Vec<String>> {
        let file = File::open(&self.cache_path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        Ok(builder
            .schema()
            .fields()
            .iter()
            .filter(|f| f.name() != TIME_COLUMN)
            .map(|f| f.name().to_string())
            .collect())
    }

    /// Initialize the cache from the source log
    ///
    /// If both the cache and mark files exist, only the mark is loaded.
    /// Otherwise the entire source is ingested and both files are
    /// created. An empty source yields an empty cache with the mark at
    /// negative infinity, so every later row counts as new.
    pub fn bootstrap(&mut self) -> Result<()> {
        if self.high_water.is_some() {
            return Ok(());
        }

        if self.cache_path.exists() && self.mark_path.exists() {
            let mark = read_mark(&self.mark_path)?;
            self.high_water = Some(mark);
            debug!(mark, "resuming from existing columnar cache");
            return Ok(());
        }

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent).context("Creating cache directory")?;
        }

        let snapshot = self.source.read_all().context("Bootstrapping cache")?;
        let schema = schema_for_channels(&snapshot.channels);
        let batch = batch_for_schema(&schema, &snapshot.channels, &snapshot.rows)?;
        write_cache_atomic(&self.cache_path, &schema, &[], &batch)?;

        let mark = snapshot.max_time().unwrap_or(f64::NEG_INFINITY);
        write_mark_atomic(&self.mark_path, mark)?;
        self.high_water = Some(mark);
        info!(
            rows = snapshot.rows.len(),
            mark, "created columnar cache from source log"
        );
        Ok(())
    }

    /// Append any new source rows to the cache, best-effort
    ///
    /// Returns the number of rows appended. All failures (missing source,
    /// malformed row, I/O error) are logged and leave both the cache and
    /// the mark unchanged; the next periodic tick is the retry mechanism.
    pub fn refresh(&mut self) -> usize {
        match self.try_refresh() {
            Ok(0) => 0,
            Ok(appended) => {
                info!(appended, mark = self.high_water, "appended new rows to cache");
                appended
            }
            Err(e) => {
                warn!(error = %e, "cache refresh failed; keeping last known good state");
                0
            }
        }
    }

    fn try_refresh(&mut self) -> Result<usize> {
        let Some(mark) = self.high_water else {
            // Bootstrap never succeeded; retry it on this tick.
            self.bootstrap()?;
            return Ok(0);
        };

        let snapshot = self.source.read_after(mark)?;
        if snapshot.rows.is_empty() {
            return Ok(0);
        }

        let file = File::open(&self.cache_path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let existing: Vec<RecordBatch> = builder
            .build()?
            .collect::<std::result::Result<_, _>>()
            .map_err(WavescopeError::from)
            .context("Reading existing cache for append")?;

        let batch = batch_for_schema(&schema, &snapshot.channels, &snapshot.rows)?;
        // Monotonic by construction: only rows with time > mark were read.
        let new_mark = snapshot.max_time().unwrap_or(mark).max(mark);

        write_cache_atomic(&self.cache_path, &schema, &existing, &batch)?;
        write_mark_atomic(&self.mark_path, new_mark)?;
        self.high_water = Some(new_mark);
        Ok(batch.num_rows())
    }
}

/// Arrow schema for a cache: `time` first, then one Float64 per channel
fn schema_for_channels(channels: &[String]) -> SchemaRef {
    let mut fields = Vec::with_capacity(channels.len() + 1);
    fields.push(Field::new(TIME_COLUMN, DataType::Float64, false));
    for channel in channels {
        fields.push(Field::new(channel, DataType::Float64, false));
    }
    Arc::new(Schema::new(fields))
}

/// Build a record batch matching `schema` from source rows
///
/// `channels` gives the column order of `rows` (the source header order);
/// columns are matched to schema fields by name so an append never
/// silently reorders channels.
fn batch_for_schema(
    schema: &SchemaRef,
    channels: &[String],
    rows: &[LogRow],
) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let mut column = Vec::with_capacity(rows.len());
        if field.name() == TIME_COLUMN {
            column.extend(rows.iter().map(|r| r.time));
        } else {
            let idx = channels
                .iter()
                .position(|c| c == field.name())
                .ok_or_else(|| {
                    WavescopeError::Cache(format!(
                        "source log no longer has channel {:?}",
                        field.name()
                    ))
                })?;
            for row in rows {
                let value = row.values.get(idx).ok_or_else(|| {
                    WavescopeError::Cache(format!(
                        "row at t={} is missing channel {:?}",
                        row.time,
                        field.name()
                    ))
                })?;
                column.push(*value);
            }
        }
        arrays.push(Arc::new(Float64Array::from(column)) as ArrayRef);
    }
    RecordBatch::try_new(schema.clone(), arrays).map_err(WavescopeError::from)
}

/// Write the cache to a temp sibling, then atomically rename into place
fn write_cache_atomic(
    path: &Path,
    schema: &SchemaRef,
    existing: &[RecordBatch],
    new_batch: &RecordBatch,
) -> Result<()> {
    let tmp = temp_sibling(path);
    {
        let file = File::create(&tmp)?;
        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        for batch in existing {
            writer.write(batch)?;
        }
        if new_batch.num_rows() > 0 {
            writer.write(new_batch)?;
        }
        writer.close()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn write_mark_atomic(path: &Path, mark: f64) -> Result<()> {
    let tmp = temp_sibling(path);
    std::fs::write(&tmp, mark.to_string())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_mark(path: &Path) -> Result<f64> {
    let contents = std::fs::read_to_string(path)?;
    contents.trim().parse::<f64>().map_err(|_| {
        WavescopeError::Cache(format!(
            "{}: high-water mark is not a number: {:?}",
            path.display(),
            contents.trim()
        ))
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "cache".into());
    name.push(".tmp");
    path.with_file_name(name)
}
