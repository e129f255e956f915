//! Interactive session over the data core
//!
//! A [`Session`] wires the pieces together the way the viewer drives
//! them: a window loader over the columnar cache, the current frame, the
//! cursor, an in-progress delta measurement and the persisted view
//! configuration. The embedding UI calls the gesture methods
//! ([`pointer_moved`](Session::pointer_moved),
//! [`primary_click`](Session::primary_click),
//! [`measure_click`](Session::measure_click),
//! [`jump_to_edge`](Session::jump_to_edge)) and a periodic
//! [`tick`](Session::tick); everything else is state the session owns.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cache::ColumnarCache;
use crate::config::ViewConfig;
use crate::cursor::{CursorReadout, CursorState, EdgeDirection};
use crate::measure::{DeltaMeasurement, DeltaResult};
use crate::types::Frame;
use crate::window::WindowLoader;

/// Half-width of the startup window around the restored cursor, seconds
pub const DEFAULT_HALF_WIDTH: f64 = 60.0;

/// Extra margin added to each window load beyond the visible range,
/// seconds
pub const VIEW_PADDING: f64 = 1.0;

/// Owned state of one interactive viewing session
#[derive(Debug)]
pub struct Session {
    loader: WindowLoader,
    frame: Frame,
    cursor: CursorState,
    delta: DeltaMeasurement,
    config: ViewConfig,
    config_path: PathBuf,
    /// Visible x range, `(min, max)`
    view_range: (f64, f64),
}

impl Session {
    /// Start a session over `cache`, restoring state from `config_path`
    ///
    /// Bootstraps the cache (a failed bootstrap is logged and retried on
    /// later ticks), loads the persisted view configuration and loads the
    /// initial window around the restored cursor time.
    pub fn start(mut cache: ColumnarCache, config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();

        if let Err(e) = cache.bootstrap() {
            warn!(error = %e, "cache bootstrap failed; starting with an empty frame");
        }

        let config = ViewConfig::load_or_default(&config_path);
        let view_range = config.x_range.unwrap_or((
            config.current_time - DEFAULT_HALF_WIDTH,
            config.current_time + DEFAULT_HALF_WIDTH,
        ));

        let mut cursor = CursorState::new();
        cursor.set_time(config.current_time);

        let mut session = Self {
            loader: WindowLoader::new(cache),
            frame: Frame::empty(),
            cursor,
            delta: DeltaMeasurement::new(),
            config,
            config_path,
            view_range,
        };
        session.tick();
        session.seed_plot_order();
        session
    }

    /// Reload the frame for the current view range
    ///
    /// Run this on the periodic timer. The loader refreshes the cache
    /// first, so newly appended source rows inside the visible range show
    /// up without any other call.
    pub fn tick(&mut self) {
        let (min, max) = self.view_range;
        let center = (min + max) / 2.0;
        let half_width = (max - min) / 2.0 + VIEW_PADDING;
        self.frame = self.loader.load_window(center, half_width);
    }

    /// Update the visible x range and reload the frame
    pub fn set_view_range(&mut self, min: f64, max: f64) {
        self.view_range = (min, max);
        self.tick();
    }

    /// The visible x range, `(min, max)`
    pub fn view_range(&self) -> (f64, f64) {
        self.view_range
    }

    /// Pointer moved to time `x`; moves the cursor unless it is locked
    pub fn pointer_moved(&mut self, x: f64) {
        self.cursor.move_to(x);
    }

    /// Primary click on `channel` at time `x`
    ///
    /// Places the cursor there, makes the channel the active readout and
    /// toggles the cursor lock.
    pub fn primary_click(&mut self, channel: impl Into<String>, x: f64) {
        self.cursor.set_time(x);
        self.cursor.set_active_channel(channel);
        self.cursor.toggle_lock();
    }

    /// Measurement click on `channel` at time `x`
    ///
    /// Returns the completed delta once two picks are in; a third pick
    /// starts a new measurement.
    pub fn measure_click(&mut self, channel: impl Into<String>, x: f64) -> Option<DeltaResult> {
        self.delta.add_point(channel, x);
        self.delta.compute(&self.frame)
    }

    /// Discard the in-progress measurement
    pub fn clear_measurement(&mut self) {
        self.delta.clear();
    }

    /// Jump the cursor to the nearest change point in `direction`
    ///
    /// Returns whether the cursor moved.
    pub fn jump_to_edge(&mut self, direction: EdgeDirection) -> bool {
        self.cursor.jump_to_edge(&self.frame, direction)
    }

    /// Set the channel display order and persist it immediately
    ///
    /// The save carries the live cursor time and view range, so a crash
    /// after a reorder never resurrects stale view state.
    pub fn reorder(&mut self, order: Vec<String>) {
        self.config.plot_order = order;
        self.config.current_time = self.cursor.current_time();
        self.config.x_range = Some(self.view_range);
        if let Err(e) = self.config.save(&self.config_path) {
            warn!(error = %e, "failed to persist plot order");
        }
    }

    /// Channel names in display order
    pub fn plot_order(&self) -> &[String] {
        &self.config.plot_order
    }

    /// Cursor readout against the current frame
    pub fn readout(&self) -> Option<CursorReadout> {
        self.cursor.readout(&self.frame)
    }

    /// The delta result for the current picks, if a measurement is
    /// complete
    pub fn delta(&self) -> Option<DeltaResult> {
        self.delta.compute(&self.frame)
    }

    /// The currently loaded frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The cursor state
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// The underlying cache
    pub fn cache(&self) -> &ColumnarCache {
        self.loader.cache()
    }

    /// Path of the persisted view configuration
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Persist the cursor time and view range for the next session
    ///
    /// Failures are logged; shutdown never aborts on a save error.
    pub fn shutdown(&mut self) {
        self.config.current_time = self.cursor.current_time();
        self.config.x_range = Some(self.view_range);
        match self.config.save(&self.config_path) {
            Ok(()) => debug!(path = %self.config_path.display(), "saved view configuration"),
            Err(e) => warn!(error = %e, "failed to save view configuration"),
        }
    }

    /// Fill an empty persisted plot order from the cache's channels
    fn seed_plot_order(&mut self) {
        if !self.config.plot_order.is_empty() {
            return;
        }
        if !self.frame.channels().is_empty() {
            self.config.plot_order = self.frame.channels().to_vec();
            return;
        }
        match self.loader.cache().channels() {
            Ok(channels) if !channels.is_empty() => self.config.plot_order = channels,
            Ok(_) => {}
            Err(e) => debug!(error = %e, "no channels available yet for plot order"),
        }
    }
}
