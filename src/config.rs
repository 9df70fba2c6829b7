//! Monitoring configuration.
//!
//! Configuration is an explicit value constructed at startup and handed to
//! the dispatcher and downloader by `Arc` - there is no ambient global
//! settings object. Values come from an optional TOML file with CLI flags
//! applied on top; see the binary for the merge order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default number of links processed concurrently per batch.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 5;

/// Default minutes between monitoring batches.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Highest accepted concurrency bound. SQLite and the external tools both
/// degrade well before this.
const MAX_CONCURRENCY_LIMIT: usize = 100;

/// Program invoked for single-media sites and live recordings.
pub const DEFAULT_MEDIA_TOOL: &str = "yt-dlp";

/// Program invoked for gallery/batch sites.
pub const DEFAULT_BATCH_TOOL: &str = "gallery-dl";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Concurrency bound outside the accepted range.
    #[error(
        "invalid max_concurrent_downloads {0}\n  Suggestion: Use a value between 1 and {MAX_CONCURRENCY_LIMIT}"
    )]
    InvalidConcurrency(usize),

    /// Interval must be at least one minute.
    #[error("invalid interval_minutes {0}\n  Suggestion: Use a value of at least 1")]
    InvalidInterval(u64),
}

/// Settings for the monitoring engine.
///
/// Immutable once built; shared across tasks via `Arc`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Maximum links processed concurrently per batch.
    pub max_concurrent_downloads: usize,
    /// Minutes between monitoring batches.
    pub interval_minutes: u64,
    /// Root directory downloads are written under. Parsed tool output is
    /// only accepted for paths below this root.
    pub media_root: PathBuf,
    /// Per-site global cookie files, keyed by lowercase site name.
    /// Used when a link has no cookies of its own.
    pub site_cookies: HashMap<String, PathBuf>,
    /// Media tool program name or path.
    pub media_tool: String,
    /// Batch tool program name or path.
    pub batch_tool: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            media_root: PathBuf::from("media"),
            site_cookies: HashMap::new(),
            media_tool: DEFAULT_MEDIA_TOOL.to_string(),
            batch_tool: DEFAULT_BATCH_TOOL.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys take their defaults; unknown keys are rejected so a
    /// typo fails loudly instead of being silently ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read,
    /// [`ConfigError::Parse`] when it is not valid TOML, or a validation
    /// error for out-of-range values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] or
    /// [`ConfigError::InvalidInterval`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_downloads == 0
            || self.max_concurrent_downloads > MAX_CONCURRENCY_LIMIT
        {
            return Err(ConfigError::InvalidConcurrency(
                self.max_concurrent_downloads,
            ));
        }

        if self.interval_minutes == 0 {
            return Err(ConfigError::InvalidInterval(self.interval_minutes));
        }

        Ok(())
    }

    /// Returns the global cookie file configured for a site, if any.
    ///
    /// Lookup is by lowercase site name.
    #[must_use]
    pub fn site_cookie(&self, site_key: &str) -> Option<&Path> {
        self.site_cookies.get(site_key).map(PathBuf::as_path)
    }
}
