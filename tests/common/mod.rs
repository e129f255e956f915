//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;
use wavescope_rs::{ColumnarCache, SourceLog};

static INIT_TRACING: Once = Once::new();

/// Initialize a tracing subscriber once per test binary
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A source CSV plus a cache directory, both inside one temp dir
pub struct Fixture {
    pub dir: TempDir,
    pub source_path: PathBuf,
    pub cache_dir: PathBuf,
}

impl Fixture {
    /// Write a source log with header `t,<channels...>` and the given rows
    pub fn new(channels: &[&str], rows: &[(f64, &[f64])]) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("create temp dir");
        let source_path = dir.path().join("monitor_log.csv");
        let cache_dir = dir.path().join("cache");

        let mut contents = format!("t,{}\n", channels.join(","));
        for (time, values) in rows {
            contents.push_str(&row_line(*time, values));
        }
        std::fs::write(&source_path, contents).expect("write source csv");

        Self {
            dir,
            source_path,
            cache_dir,
        }
    }

    /// Append more rows to the source log
    pub fn append(&self, rows: &[(f64, &[f64])]) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.source_path)
            .expect("open source csv for append");
        for (time, values) in rows {
            file.write_all(row_line(*time, values).as_bytes())
                .expect("append to source csv");
        }
    }

    /// A cache over this fixture's source, using the default file names
    pub fn cache(&self) -> ColumnarCache {
        ColumnarCache::in_dir(&self.source_path, &self.cache_dir)
    }

    /// A reader over this fixture's source
    pub fn source(&self) -> SourceLog {
        SourceLog::new(&self.source_path)
    }

    /// Path the session's view configuration goes to
    pub fn config_path(&self) -> PathBuf {
        self.cache_dir.join("plot_config.json")
    }
}

fn row_line(time: f64, values: &[f64]) -> String {
    let fields: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("{},{}\n", time, fields.join(","))
}

/// Read a file's raw bytes, panicking with the path on failure
pub fn read_bytes(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
