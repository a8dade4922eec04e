//! Tests for configuration loading.

use medialib::{MediaLibraryConfig, TableNameMode, TablesConfig, errno};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_bundled_defaults() {
    let config = MediaLibraryConfig::bundled().unwrap();
    assert!(!config.tables().compatibility());
    assert_eq!(config.tables().mode(), TableNameMode::Standard);
    assert_eq!(*config.picture_cache().ttl_secs(), 20);
    assert_eq!(*config.picture_cache().max_high_quality(), 3);
    assert_eq!(config.dfx().report_interval(), Duration::from_secs(24 * 60 * 60));
    assert_eq!(config.observability().service_name(), "medialib");
    assert!(*config.capture().sync_on_start());
    assert_eq!(*config.capture().event_queue(), 64);
}

#[test]
fn test_bundled_matches_default_impl() {
    assert_eq!(MediaLibraryConfig::bundled().unwrap(), MediaLibraryConfig::default());
}

#[test]
fn test_file_overrides_bundled_values() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[tables]\ncompatibility = true\n\n[picture_cache]\nttl_secs = 5\n\n[dfx]\nreport_interval_hours = 1"
    )
    .unwrap();

    let config = MediaLibraryConfig::from_file(file.path()).unwrap();
    assert_eq!(config.tables().mode(), TableNameMode::Compatibility);
    assert_eq!(*config.picture_cache().ttl_secs(), 5);
    // Untouched keys keep their bundled values.
    assert_eq!(*config.picture_cache().max_low_quality(), 16);
    assert_eq!(config.dfx().report_interval(), Duration::from_secs(3600));
    assert_eq!(*config.capture().event_queue(), 64);
}

#[test]
fn test_invalid_file_is_config_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[picture_cache]\nttl_secs = \"soon\"").unwrap();

    let err = MediaLibraryConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.errno(), errno::E_CONFIG_INVALID);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MediaLibraryConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.errno(), errno::E_CONFIG_INVALID);
}

#[test]
fn test_setters_and_builders() {
    let tables = medialib::TablesConfigBuilder::default()
        .compatibility(true)
        .build()
        .unwrap();
    let config = MediaLibraryConfig::default().with_tables(tables.clone());
    assert_eq!(config.tables(), &tables);
    assert_eq!(TablesConfig::default().mode(), TableNameMode::Standard);
}
