//! Core data types for the wavescope data core
//!
//! This module contains the fundamental data structures used throughout
//! the crate for representing log samples and windowed frames.
//!
//! # Main Types
//!
//! - [`LogRow`] - A single timestamped sample from the source log
//! - [`Frame`] - The columnar in-memory slice of rows currently loaded
//!   for display
//!
//! # Invariants
//!
//! A [`Frame`] keeps its rows sorted ascending by time, and every channel
//! column has exactly one value per row. The channel set is fixed when the
//! frame is built and matches the source log's columns 1..N in order.
//!
//! # Nearest-row resolution
//!
//! [`Frame::nearest_index`] resolves an arbitrary time to the row with the
//! minimum absolute time distance. Ties are broken toward the smaller
//! index so repeated lookups are deterministic.

use std::collections::HashMap;

/// A single timestamped sample from the source log
///
/// `values` are aligned with the channel order of the frame or source
/// header the row came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// Sample time in seconds
    pub time: f64,
    /// One value per channel, in channel order
    pub values: Vec<f64>,
}

impl LogRow {
    /// Create a new row
    pub fn new(time: f64, values: Vec<f64>) -> Self {
        Self { time, values }
    }
}

/// Columnar in-memory storage for the currently loaded time window
///
/// Built by the window loader from the columnar cache; borrowed (never
/// mutated) by cursor and delta-measurement lookups.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Sample times, sorted ascending
    times: Vec<f64>,
    /// Channel names in display/source order
    channels: Vec<String>,
    /// One column of values per channel, each the same length as `times`
    columns: HashMap<String, Vec<f64>>,
}

impl Frame {
    /// Create an empty frame with no channels
    ///
    /// This is the benign "no data available" value returned when a
    /// window query fails or matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame from a time column and named channel columns
    ///
    /// `channels` fixes the channel order; every entry must have a column
    /// of the same length as `times`. Columns for unknown channels are
    /// dropped.
    pub fn from_columns(
        times: Vec<f64>,
        channels: Vec<String>,
        mut columns: HashMap<String, Vec<f64>>,
    ) -> Self {
        columns.retain(|name, col| channels.iter().any(|c| c == name) && col.len() == times.len());
        Self {
            times,
            channels,
            columns,
        }
    }

    /// Build a frame from rows that share `channels` as their column order
    ///
    /// Rows whose value count does not match `channels` are dropped, so
    /// every column stays exactly one value per row.
    pub fn from_rows(channels: Vec<String>, rows: &[LogRow]) -> Self {
        let mut times = Vec::with_capacity(rows.len());
        let mut columns: HashMap<String, Vec<f64>> = channels
            .iter()
            .map(|c| (c.clone(), Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            if row.values.len() != channels.len() {
                continue;
            }
            times.push(row.time);
            for (channel, value) in channels.iter().zip(&row.values) {
                if let Some(col) = columns.get_mut(channel) {
                    col.push(*value);
                }
            }
        }

        Self {
            times,
            channels,
            columns,
        }
    }

    /// Number of rows in the frame
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Check if the frame holds no rows
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Channel names in display order
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Sample times, sorted ascending
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Time of the row at `index`
    ///
    /// Returns `None` when the index is out of range.
    pub fn time_at(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// The full value column for a channel
    pub fn column(&self, channel: &str) -> Option<&[f64]> {
        self.columns.get(channel).map(|c| c.as_slice())
    }

    /// The value of one channel at one row
    pub fn value(&self, channel: &str, index: usize) -> Option<f64> {
        self.columns.get(channel)?.get(index).copied()
    }

    /// The time range covered by the frame, `(first, last)`
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.times.first()?;
        let last = self.times.last()?;
        Some((*first, *last))
    }

    /// Index of the row nearest to `time` by absolute distance
    ///
    /// Ties are broken toward the smaller index. Returns `None` for an
    /// empty frame.
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.times.is_empty() {
            return None;
        }

        let pos = self.times.partition_point(|&t| t < time);
        if pos == 0 {
            return Some(0);
        }
        if pos == self.times.len() {
            return Some(self.times.len() - 1);
        }

        // Prefer the left neighbor on an exact distance tie.
        let left = pos - 1;
        if (time - self.times[left]).abs() <= (self.times[pos] - time).abs() {
            Some(left)
        } else {
            Some(pos)
        }
    }
}
