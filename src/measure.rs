//! Two-point delta measurement
//!
//! The operator picks two x positions on a channel; the measurement snaps
//! each pick to the nearest sample row and reports the time difference
//! and value difference between them. A third pick starts a fresh
//! measurement with that pick as its first point.

use crate::types::Frame;

/// Result of a completed two-point measurement
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaResult {
    /// Channel the measurement was taken on
    pub channel: String,
    /// Snapped time of the earlier pick
    pub x1: f64,
    /// Snapped time of the later pick
    pub x2: f64,
    /// Channel value at the earlier pick
    pub y1: f64,
    /// Channel value at the later pick
    pub y2: f64,
    /// Absolute time difference, `|x2 - x1|`
    pub dt: f64,
    /// Signed value difference, `y2 - y1`
    pub dy: f64,
}

/// Accumulator for two measurement picks on a channel
#[derive(Debug, Clone, Default)]
pub struct DeltaMeasurement {
    channel: Option<String>,
    picks: Vec<f64>,
}

impl DeltaMeasurement {
    /// Create an empty measurement
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel the current picks belong to
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The raw (unsnapped) pick positions, at most two
    pub fn picks(&self) -> &[f64] {
        &self.picks
    }

    /// Whether two picks are present
    pub fn is_complete(&self) -> bool {
        self.picks.len() == 2
    }

    /// Record a measurement pick at `x` on `channel`
    ///
    /// Each pick rebinds the channel. A pick while two are already stored
    /// discards both and starts over with this one as the first point.
    pub fn add_point(&mut self, channel: impl Into<String>, x: f64) {
        if self.picks.len() >= 2 {
            self.picks.clear();
        }
        self.channel = Some(channel.into());
        self.picks.push(x);
    }

    /// Discard any in-progress measurement
    ///
    /// Safe to call at any time, including when nothing is stored.
    pub fn clear(&mut self) {
        self.channel = None;
        self.picks.clear();
    }

    /// Compute the delta for the current picks against `frame`
    ///
    /// Returns `None` unless exactly two picks are stored and both snap
    /// to rows carrying the measured channel. Picks are ordered by x
    /// before snapping, so `x1 <= x2` regardless of pick order.
    pub fn compute(&self, frame: &Frame) -> Option<DeltaResult> {
        if self.picks.len() != 2 {
            return None;
        }
        let channel = self.channel.as_deref()?;

        let (mut a, mut b) = (self.picks[0], self.picks[1]);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }

        let i1 = frame.nearest_index(a)?;
        let i2 = frame.nearest_index(b)?;
        let x1 = frame.time_at(i1)?;
        let x2 = frame.time_at(i2)?;
        let y1 = frame.value(channel, i1)?;
        let y2 = frame.value(channel, i2)?;

        Some(DeltaResult {
            channel: channel.to_string(),
            x1,
            x2,
            y1,
            y2,
            dt: (x2 - x1).abs(),
            dy: y2 - y1,
        })
    }
}
