//! Persisted view configuration
//!
//! A small JSON file next to the cache remembers the channel display
//! order, the last cursor time and the last visible x range, so a
//! restarted session resumes where the previous one left off.
//!
//! Saves go through a temp file and an atomic rename so a crash mid-save
//! leaves the previous config intact.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ResultExt};

/// Default file name for the persisted view configuration
pub const DEFAULT_CONFIG_FILE: &str = "plot_config.json";

/// View state persisted across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Channel names in display order
    #[serde(default)]
    pub plot_order: Vec<String>,
    /// Cursor time at last shutdown
    #[serde(default)]
    pub current_time: f64,
    /// Visible x range at last shutdown, `(min, max)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_range: Option<(f64, f64)>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            plot_order: Vec::new(),
            current_time: 0.0,
            x_range: None,
        }
    }
}

impl ViewConfig {
    /// Load the configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, falling back to defaults
    ///
    /// A missing or unreadable file is logged and treated as a fresh
    /// start; it never aborts the session.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    warn!(error = %e, path = %path.display(), "failed to load config, using defaults");
                }
                Self::default()
            }
        }
    }

    /// Save the configuration as pretty-printed JSON
    ///
    /// Writes a temp sibling first and renames it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)
            .context("serializing config")?;

        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, contents)
            .with_context(|| format!("writing config to {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("publishing config to {}", path.display()))?;
        Ok(())
    }
}
