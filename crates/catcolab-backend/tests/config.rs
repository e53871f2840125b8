//! Loading sync configuration from disk.

use catcolab_backend::{ConfigError, SyncConfig, DEFAULT_SERVER};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;

#[test]
fn loads_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
server = "localhost:8000"
library_capacity = 10
pinned_snapshot_ttl_secs = 120
"#
    )
    .unwrap();

    let config = SyncConfig::load(file.path()).unwrap();
    assert_eq!(
        config,
        SyncConfig::new()
            .with_server("localhost:8000")
            .with_library_capacity(10)
            .with_pinned_snapshot_ttl(Duration::from_secs(120))
    );
}

#[test]
fn empty_file_is_default() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = SyncConfig::load(file.path()).unwrap();
    assert_eq!(config.server, DEFAULT_SERVER);
    assert_eq!(config.pinned_snapshot_ttl(), None);
    assert_eq!(config.library_capacity, None);
}

#[test]
fn malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync.toml");
    std::fs::write(&path, "server = [").unwrap();

    assert!(matches!(SyncConfig::load(&path), Err(ConfigError::Parse(_))));
}
