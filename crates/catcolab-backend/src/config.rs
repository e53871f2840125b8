//! Sync configuration
//!
//! Loaded from TOML; every field has a default.
//!
//! ```toml
//! server = "backend.catcolab.org"
//! library_capacity = 1000      # unbounded when absent
//! pinned_snapshot_capacity = 256
//! pinned_snapshot_ttl_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default backend server
pub const DEFAULT_SERVER: &str = "backend.catcolab.org";

/// Configuration of the resolver and document library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Server that unqualified references and links resolve against
    pub server: String,
    /// Maximum live documents kept by a library, `None` for unbounded
    ///
    /// A soft bound: an evicted document that is still in use gets a second
    /// live instance, with its own subscription, on the next fetch.
    pub library_capacity: Option<u64>,
    /// Maximum pinned snapshots kept by a resolver
    pub pinned_snapshot_capacity: u64,
    /// Expiry of pinned snapshots, `None` to keep until evicted
    pub pinned_snapshot_ttl_secs: Option<u64>,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend server
    #[inline]
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// With library capacity
    #[inline]
    #[must_use]
    pub fn with_library_capacity(mut self, capacity: u64) -> Self {
        self.library_capacity = Some(capacity);
        self
    }

    /// With pinned snapshot capacity
    #[inline]
    #[must_use]
    pub fn with_pinned_snapshot_capacity(mut self, capacity: u64) -> Self {
        self.pinned_snapshot_capacity = capacity;
        self
    }

    /// With pinned snapshot expiry
    #[inline]
    #[must_use]
    pub fn with_pinned_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.pinned_snapshot_ttl_secs = Some(ttl.as_secs());
        self
    }

    /// Pinned snapshot expiry
    #[inline]
    #[must_use]
    pub fn pinned_snapshot_ttl(&self) -> Option<Duration> {
        self.pinned_snapshot_ttl_secs.map(Duration::from_secs)
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns error if the TOML is invalid
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            library_capacity: None,
            pinned_snapshot_capacity: 256,
            pinned_snapshot_ttl_secs: None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
