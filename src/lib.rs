//! # Wavescope-RS: Waveform Log Viewer Data Core
//!
//! The data layer of an interactive waveform-log viewer: it ingests an
//! append-only CSV monitoring log into a columnar Parquet cache, serves
//! bounded time windows from it, and owns the interactive state a plot
//! surface needs (cursor, edge navigation, two-point delta measurement,
//! persisted view configuration). Rendering is deliberately out of
//! scope; an embedding UI drives a [`Session`] and draws whatever the
//! session reports.
//!
//! ## Architecture
//!
//! - **Cache**: [`ColumnarCache`] mirrors the CSV source log into a
//!   Parquet file plus a high-water-mark file, appending only rows newer
//!   than the mark on each refresh
//! - **Window**: [`WindowLoader`] answers `(center, half_width)` queries
//!   with row-group pruning and a pushed-down time filter, returning a
//!   columnar [`Frame`]
//! - **Interaction**: [`CursorState`], [`DeltaMeasurement`] and
//!   [`ViewConfig`] hold the cursor/lock state, the in-progress
//!   measurement and the persisted view settings
//! - **Session**: [`Session`] owns all of the above and exposes the
//!   gesture surface (`tick`, `pointer_moved`, `primary_click`,
//!   `measure_click`, `jump_to_edge`, `reorder`, `shutdown`)
//!
//! ## Files
//!
//! Next to the cache directory the crate maintains:
//!
//! - `monitor_log.parquet` - the columnar cache
//! - `monitor_log.last_time` - the high-water mark (max migrated time)
//! - `plot_config.json` - channel order, cursor time and x range
//!
//! All three are published via temp-file-plus-rename so a crash never
//! leaves a half-written file behind.
//!
//! ## Example
//!
//! ```ignore
//! use wavescope_rs::{ColumnarCache, EdgeDirection, Session};
//!
//! let cache = ColumnarCache::in_dir("monitor_log.csv", "cache");
//! let mut session = Session::start(cache, "cache/plot_config.json");
//!
//! // Periodic timer:
//! session.tick();
//!
//! // UI gestures:
//! session.pointer_moved(12.5);
//! session.primary_click("volts", 12.5);
//! session.jump_to_edge(EdgeDirection::Next);
//! if let Some(readout) = session.readout() {
//!     println!("t={} {:?}", readout.time, readout.values);
//! }
//!
//! session.shutdown();
//! ```

pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod measure;
pub mod session;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use cache::{ColumnarCache, SourceLog, SourceSnapshot};
pub use config::ViewConfig;
pub use cursor::{CursorReadout, CursorState, EdgeDirection};
pub use error::{Result, ResultExt, WavescopeError};
pub use measure::{DeltaMeasurement, DeltaResult};
pub use session::Session;
pub use types::{Frame, LogRow};
pub use window::WindowLoader;
