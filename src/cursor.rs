//! Cursor position and discrete edge navigation
//!
//! Tracks "where is the user looking": the current cursor time, which
//! channel the primary readout follows, and a lock flag that suppresses
//! pointer-driven updates once the operator has pinned the cursor with a
//! click.
//!
//! # Lock state machine
//!
//! Two states: `unlocked` (pointer movement updates the cursor) and
//! `locked` (only explicit placement and edge jumps apply). Each primary
//! click toggles the state; the initial state is unlocked.
//!
//! # Edge navigation
//!
//! [`CursorState::jump_to_edge`] steps the cursor between change points —
//! indices where a channel's value differs from its predecessor — so
//! discrete/digital signals can be walked transition by transition
//! instead of scrubbed continuously.

use crate::types::Frame;

/// Direction for an edge jump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// The nearest change point after the cursor
    Next,
    /// The nearest change point before the cursor
    Prev,
}

/// Values shown for the cursor's snapped row
#[derive(Debug, Clone, PartialEq)]
pub struct CursorReadout {
    /// Index of the snapped row in the frame
    pub index: usize,
    /// Actual sample time of the snapped row
    pub time: f64,
    /// The channel the primary readout follows, if any
    pub active_channel: Option<String>,
    /// Value of the active channel at the snapped row
    pub active_value: Option<f64>,
    /// Value of every channel at the snapped row, in frame order
    pub values: Vec<(String, f64)>,
}

/// Cursor time, active channel and lock flag for the interactive session
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    current_time: f64,
    active_channel: Option<String>,
    locked: bool,
}

impl CursorState {
    /// Create an unlocked cursor at t=0 with no active channel
    pub fn new() -> Self {
        Self::default()
    }

    /// The current cursor time
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether pointer-driven updates are currently suppressed
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The channel the primary readout follows
    pub fn active_channel(&self) -> Option<&str> {
        self.active_channel.as_deref()
    }

    /// Pointer-driven cursor movement
    ///
    /// Ignored while locked. Returns whether the cursor moved.
    pub fn move_to(&mut self, time: f64) -> bool {
        if self.locked {
            return false;
        }
        self.current_time = time;
        true
    }

    /// Explicit cursor placement (click or edge jump); applies even when
    /// locked
    pub fn set_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Flip the lock flag
    ///
    /// A click pins the cursor; the next click releases it.
    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
    }

    /// Record which channel's value the primary readout shows
    pub fn set_active_channel(&mut self, channel: impl Into<String>) {
        self.active_channel = Some(channel.into());
    }

    /// Index of the frame row nearest to the cursor
    pub fn nearest_index(&self, frame: &Frame) -> Option<usize> {
        frame.nearest_index(self.current_time)
    }

    /// Snap the cursor to its nearest row and report every channel's value
    ///
    /// Returns `None` for an empty frame.
    pub fn readout(&self, frame: &Frame) -> Option<CursorReadout> {
        let index = self.nearest_index(frame)?;
        let time = frame.time_at(index)?;
        let values: Vec<(String, f64)> = frame
            .channels()
            .iter()
            .filter_map(|c| frame.value(c, index).map(|v| (c.clone(), v)))
            .collect();
        let active_value = self
            .active_channel
            .as_deref()
            .and_then(|c| frame.value(c, index));
        Some(CursorReadout {
            index,
            time,
            active_channel: self.active_channel.clone(),
            active_value,
            values,
        })
    }

    /// Jump to the nearest change point across all channels
    ///
    /// For every channel the change points are the indices whose value
    /// differs from the previous row. `Next` picks the smallest such
    /// index greater than the cursor's nearest row, `Prev` the largest
    /// one below it; across channels the minimum (`Next`) or maximum
    /// (`Prev`) candidate wins. A no-op returning `false` when no channel
    /// has a qualifying change point.
    pub fn jump_to_edge(&mut self, frame: &Frame, direction: EdgeDirection) -> bool {
        let Some(idx_now) = self.nearest_index(frame) else {
            return false;
        };

        let mut candidates = Vec::new();
        for channel in frame.channels() {
            let Some(values) = frame.column(channel) else {
                continue;
            };
            let changes = change_points(values);
            let candidate = match direction {
                EdgeDirection::Next => changes.iter().copied().find(|&i| i > idx_now),
                EdgeDirection::Prev => changes.iter().rev().copied().find(|&i| i < idx_now),
            };
            if let Some(i) = candidate {
                candidates.push(i);
            }
        }

        let new_idx = match direction {
            EdgeDirection::Next => candidates.into_iter().min(),
            EdgeDirection::Prev => candidates.into_iter().max(),
        };
        let Some(new_idx) = new_idx else {
            return false;
        };
        let Some(time) = frame.time_at(new_idx) else {
            return false;
        };
        self.current_time = time;
        true
    }
}

/// Indices where a value differs from its predecessor
fn change_points(values: &[f64]) -> Vec<usize> {
    values
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogRow;

    /// One digital channel: [0,0,1,1,0,0] at t=[0..5]
    fn digital_frame() -> Frame {
        let values = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let rows: Vec<LogRow> = values
            .iter()
            .enumerate()
            .map(|(i, v)| LogRow::new(i as f64, vec![*v]))
            .collect();
        Frame::from_rows(vec!["d".to_string()], &rows)
    }

    #[test]
    fn test_change_points() {
        assert_eq!(change_points(&[0.0, 0.0, 1.0, 1.0, 0.0, 0.0]), vec![2, 4]);
        assert_eq!(change_points(&[1.0, 1.0, 1.0]), Vec::<usize>::new());
        assert_eq!(change_points(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_lock_suppresses_pointer_moves() {
        let mut cursor = CursorState::new();
        assert!(!cursor.is_locked());
        assert!(cursor.move_to(1.0));
        assert_eq!(cursor.current_time(), 1.0);

        cursor.toggle_lock();
        assert!(!cursor.move_to(2.0));
        assert_eq!(cursor.current_time(), 1.0);

        // Explicit placement still applies while locked.
        cursor.set_time(3.0);
        assert_eq!(cursor.current_time(), 3.0);

        cursor.toggle_lock();
        assert!(cursor.move_to(4.0));
    }

    #[test]
    fn test_jump_to_next_edge_sequence() {
        let frame = digital_frame();
        let mut cursor = CursorState::new();
        cursor.set_time(0.0);

        assert!(cursor.jump_to_edge(&frame, EdgeDirection::Next));
        assert_eq!(cursor.current_time(), 2.0);

        assert!(cursor.jump_to_edge(&frame, EdgeDirection::Next));
        assert_eq!(cursor.current_time(), 4.0);

        // No change point remains after index 4.
        assert!(!cursor.jump_to_edge(&frame, EdgeDirection::Next));
        assert_eq!(cursor.current_time(), 4.0);
    }

    #[test]
    fn test_jump_to_prev_edge() {
        let frame = digital_frame();
        let mut cursor = CursorState::new();
        cursor.set_time(5.0);

        assert!(cursor.jump_to_edge(&frame, EdgeDirection::Prev));
        assert_eq!(cursor.current_time(), 4.0);

        assert!(cursor.jump_to_edge(&frame, EdgeDirection::Prev));
        assert_eq!(cursor.current_time(), 2.0);

        assert!(!cursor.jump_to_edge(&frame, EdgeDirection::Prev));
        assert_eq!(cursor.current_time(), 2.0);
    }

    #[test]
    fn test_jump_picks_minimum_candidate_across_channels() {
        // Channel a changes at index 3, channel b at index 1.
        let rows = vec![
            LogRow::new(0.0, vec![0.0, 0.0]),
            LogRow::new(1.0, vec![0.0, 1.0]),
            LogRow::new(2.0, vec![0.0, 1.0]),
            LogRow::new(3.0, vec![1.0, 1.0]),
        ];
        let frame = Frame::from_rows(vec!["a".to_string(), "b".to_string()], &rows);
        let mut cursor = CursorState::new();
        cursor.set_time(0.0);

        assert!(cursor.jump_to_edge(&frame, EdgeDirection::Next));
        assert_eq!(cursor.current_time(), 1.0);
    }

    #[test]
    fn test_jump_on_empty_frame_is_a_noop() {
        let mut cursor = CursorState::new();
        assert!(!cursor.jump_to_edge(&Frame::empty(), EdgeDirection::Next));
    }

    #[test]
    fn test_readout_snaps_and_reports_all_channels() {
        let frame = digital_frame();
        let mut cursor = CursorState::new();
        cursor.set_active_channel("d");
        cursor.set_time(2.2);

        let readout = cursor.readout(&frame).unwrap();
        assert_eq!(readout.index, 2);
        assert_eq!(readout.time, 2.0);
        assert_eq!(readout.active_value, Some(1.0));
        assert_eq!(readout.values, vec![("d".to_string(), 1.0)]);
    }

    #[test]
    fn test_readout_on_empty_frame() {
        let cursor = CursorState::new();
        assert!(cursor.readout(&Frame::empty()).is_none());
    }
}
