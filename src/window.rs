//! Bounded time-window queries against the columnar cache
//!
//! A [`WindowLoader`] turns `(center, half_width)` into a [`Frame`] of
//! exactly the rows whose time lies in `[center - half_width,
//! center + half_width]`, refreshing the cache first so the window always
//! reflects the latest ingested data.
//!
//! Range pushdown: row groups whose time statistics cannot overlap the
//! window are skipped entirely, and the surviving rows are filtered
//! inside the Parquet reader. The cache file is never fully decoded just
//! to filter client-side.
//!
//! Failures are not fatal: any error yields an empty frame and a warning,
//! and callers treat an empty frame as "no data available".

use std::collections::HashMap;
use std::fs::File;

use arrow_array::{Array, BooleanArray, Float64Array, RecordBatch};
use arrow_schema::ArrowError;
use parquet::arrow::arrow_reader::{ArrowPredicateFn, ParquetRecordBatchReaderBuilder, RowFilter};
use parquet::arrow::ProjectionMask;
use parquet::file::metadata::RowGroupMetaData;
use parquet::file::statistics::Statistics;
use tracing::{debug, warn};

use crate::cache::{ColumnarCache, TIME_COLUMN};
use crate::error::{Result, WavescopeError};
use crate::types::Frame;

/// Loader for bounded time windows over a [`ColumnarCache`]
///
/// Owns the cache so every load can refresh it first; holds no other
/// state, so the result is a pure function of (cache contents, center,
/// half-width).
#[derive(Debug)]
pub struct WindowLoader {
    cache: ColumnarCache,
}

impl WindowLoader {
    /// Create a loader over `cache`
    pub fn new(cache: ColumnarCache) -> Self {
        Self { cache }
    }

    /// The underlying cache
    pub fn cache(&self) -> &ColumnarCache {
        &self.cache
    }

    /// The underlying cache, mutably
    pub fn cache_mut(&mut self) -> &mut ColumnarCache {
        &mut self.cache
    }

    /// Load the rows with time in `[center - half_width, center + half_width]`
    ///
    /// Refreshes the cache first. On any failure this logs and returns an
    /// empty frame; an empty frame is "no data available", never a fatal
    /// condition.
    pub fn load_window(&mut self, center: f64, half_width: f64) -> Frame {
        self.cache.refresh();

        let lo = center - half_width;
        let hi = center + half_width;
        match self.read_range(lo, hi) {
            Ok(frame) => {
                debug!(rows = frame.len(), lo, hi, "loaded window");
                frame
            }
            Err(e) => {
                warn!(error = %e, lo, hi, "window load failed; returning empty frame");
                Frame::empty()
            }
        }
    }

    /// Read `[lo, hi]` from the cache with row-group pruning and a row
    /// filter on the time column
    fn read_range(&self, lo: f64, hi: f64) -> Result<Frame> {
        let file = File::open(self.cache.cache_path())?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let schema = builder.schema().clone();
        let time_idx = schema.index_of(TIME_COLUMN)?;
        let channels: Vec<String> = schema
            .fields()
            .iter()
            .filter(|f| f.name() != TIME_COLUMN)
            .map(|f| f.name().to_string())
            .collect();

        // Prune row groups whose time statistics cannot overlap [lo, hi].
        let keep: Vec<usize> = builder
            .metadata()
            .row_groups()
            .iter()
            .enumerate()
            .filter(|(_, rg)| row_group_overlaps(rg, time_idx, lo, hi))
            .map(|(i, _)| i)
            .collect();

        let mask = ProjectionMask::leaves(builder.parquet_schema(), [time_idx]);
        let predicate = ArrowPredicateFn::new(mask, move |batch: RecordBatch| {
            let times = batch
                .column(0)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    ArrowError::SchemaError("time column is not Float64".to_string())
                })?;
            Ok(BooleanArray::from_iter(
                times.iter().map(|t| t.map(|t| t >= lo && t <= hi)),
            ))
        });

        let reader = builder
            .with_row_groups(keep)
            .with_row_filter(RowFilter::new(vec![Box::new(predicate)]))
            .build()?;

        let mut times = Vec::new();
        let mut columns: HashMap<String, Vec<f64>> = channels
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();

        for batch in reader {
            let batch = batch?;
            times.extend_from_slice(column_as_f64(&batch, TIME_COLUMN)?.values());
            for channel in &channels {
                let array = column_as_f64(&batch, channel)?;
                if let Some(column) = columns.get_mut(channel) {
                    column.extend_from_slice(array.values());
                }
            }
        }

        Ok(Frame::from_columns(times, channels, columns))
    }
}

/// Keep a row group unless its time statistics prove it cannot overlap
fn row_group_overlaps(rg: &RowGroupMetaData, time_idx: usize, lo: f64, hi: f64) -> bool {
    match rg.column(time_idx).statistics() {
        Some(Statistics::Double(stats)) => match (stats.min_opt(), stats.max_opt()) {
            (Some(min), Some(max)) => *max >= lo && *min <= hi,
            _ => true,
        },
        // Without usable statistics, decode the group and let the row
        // filter decide.
        _ => true,
    }
}

fn column_as_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    let array = batch.column_by_name(name).ok_or_else(|| {
        WavescopeError::Cache(format!("cache is missing column {name:?}"))
    })?;
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| WavescopeError::Cache(format!("cache column {name:?} is not Float64")))
}
