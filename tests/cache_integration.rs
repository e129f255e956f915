//! Integration tests for the incremental columnar cache

mod common;

use common::{read_bytes, Fixture};
use wavescope_rs::WindowLoader;

#[test]
fn test_bootstrap_creates_cache_and_mark() {
    let fixture = Fixture::new(
        &["volts", "amps"],
        &[(0.0, &[1.0, 2.0]), (0.5, &[1.5, 2.5]), (1.0, &[2.0, 3.0])],
    );
    let mut cache = fixture.cache();
    assert!(!cache.is_bootstrapped());

    cache.bootstrap().expect("bootstrap");
    assert!(cache.is_bootstrapped());
    assert!(cache.cache_path().exists());
    assert!(cache.mark_path().exists());
    assert_eq!(cache.high_water_mark(), Some(1.0));
    assert_eq!(cache.channels().expect("channels"), vec!["volts", "amps"]);
}

#[test]
fn test_bootstrap_resumes_from_existing_files() {
    let fixture = Fixture::new(&["v"], &[(0.0, &[1.0]), (1.0, &[2.0])]);
    fixture.cache().bootstrap().expect("first bootstrap");

    // A second cache over the same directory resumes the mark instead of
    // re-ingesting the source.
    let before = read_bytes(&fixture.cache_dir.join("monitor_log.parquet"));
    let mut resumed = fixture.cache();
    resumed.bootstrap().expect("resume bootstrap");
    assert_eq!(resumed.high_water_mark(), Some(1.0));
    let after = read_bytes(resumed.cache_path());
    assert_eq!(before, after);
}

#[test]
fn test_bootstrap_of_empty_source() {
    let fixture = Fixture::new(&["v"], &[]);
    let mut cache = fixture.cache();
    cache.bootstrap().expect("bootstrap empty source");
    assert_eq!(cache.high_water_mark(), Some(f64::NEG_INFINITY));

    // The first appended row counts as new.
    fixture.append(&[(0.0, &[42.0])]);
    assert_eq!(cache.refresh(), 1);
    assert_eq!(cache.high_water_mark(), Some(0.0));
}

#[test]
fn test_refresh_without_new_rows_is_byte_identical() {
    let fixture = Fixture::new(&["v"], &[(0.0, &[1.0]), (1.0, &[2.0])]);
    let mut cache = fixture.cache();
    cache.bootstrap().expect("bootstrap");

    let cache_before = read_bytes(cache.cache_path());
    let mark_before = read_bytes(cache.mark_path());

    assert_eq!(cache.refresh(), 0);
    assert_eq!(cache.refresh(), 0);

    assert_eq!(read_bytes(cache.cache_path()), cache_before);
    assert_eq!(read_bytes(cache.mark_path()), mark_before);
}

#[test]
fn test_refresh_appends_without_loss() {
    let rows: Vec<(f64, Vec<f64>)> = (0..20).map(|i| (i as f64 * 0.5, vec![i as f64])).collect();
    let row_refs: Vec<(f64, &[f64])> = rows.iter().map(|(t, v)| (*t, v.as_slice())).collect();
    let fixture = Fixture::new(&["v"], &row_refs);

    let mut cache = fixture.cache();
    cache.bootstrap().expect("bootstrap");

    let appended: Vec<(f64, Vec<f64>)> =
        (20..35).map(|i| (i as f64 * 0.5, vec![i as f64])).collect();
    let appended_refs: Vec<(f64, &[f64])> =
        appended.iter().map(|(t, v)| (*t, v.as_slice())).collect();
    fixture.append(&appended_refs);

    assert_eq!(cache.refresh(), 15);
    assert_eq!(cache.high_water_mark(), Some(17.0));

    // Every row is present exactly once and in order.
    let mut loader = WindowLoader::new(cache);
    let frame = loader.load_window(10.0, 100.0);
    assert_eq!(frame.len(), 35);
    let times = frame.times();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(frame.value("v", 34), Some(34.0));
}

#[test]
fn test_refresh_with_missing_source_keeps_state() {
    let fixture = Fixture::new(&["v"], &[(0.0, &[1.0])]);
    let mut cache = fixture.cache();
    cache.bootstrap().expect("bootstrap");
    let cache_before = read_bytes(cache.cache_path());

    std::fs::remove_file(&fixture.source_path).expect("remove source");

    assert_eq!(cache.refresh(), 0);
    assert_eq!(cache.high_water_mark(), Some(0.0));
    assert_eq!(read_bytes(cache.cache_path()), cache_before);
}

#[test]
fn test_refresh_mark_is_monotonic() {
    let fixture = Fixture::new(&["v"], &[(0.0, &[1.0]), (5.0, &[2.0])]);
    let mut cache = fixture.cache();
    cache.bootstrap().expect("bootstrap");
    assert_eq!(cache.high_water_mark(), Some(5.0));

    // Rows at or before the mark are never re-ingested, so the mark
    // cannot move backwards.
    fixture.append(&[(3.0, &[9.0]), (4.0, &[9.0])]);
    assert_eq!(cache.refresh(), 0);
    assert_eq!(cache.high_water_mark(), Some(5.0));

    fixture.append(&[(6.0, &[3.0])]);
    assert_eq!(cache.refresh(), 1);
    assert_eq!(cache.high_water_mark(), Some(6.0));
}

#[test]
fn test_failed_bootstrap_retries_on_refresh() {
    let fixture = Fixture::new(&["v"], &[(0.0, &[1.0])]);
    let mut cache = fixture.cache();

    std::fs::remove_file(&fixture.source_path).expect("remove source");
    assert!(cache.bootstrap().is_err());
    assert!(!cache.is_bootstrapped());

    // Refresh with the source still missing stays unbootstrapped.
    assert_eq!(cache.refresh(), 0);
    assert!(!cache.is_bootstrapped());

    // Once the source reappears, the next refresh bootstraps.
    std::fs::write(&fixture.source_path, "t,v\n1.0,7.0\n").expect("recreate source");
    assert_eq!(cache.refresh(), 0);
    assert!(cache.is_bootstrapped());
    assert_eq!(cache.high_water_mark(), Some(1.0));
}
