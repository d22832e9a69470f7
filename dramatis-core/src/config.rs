//! Configuration for the dramatis roster, loadable from TOML.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [persistence]
//! backend = "sqlite"
//! path = "roster.db"
//!
//! [analytics]
//! dominant_trait_count = 3
//!
//! [report]
//! include_network = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::personality::DEFAULT_DOMINANT_COUNT;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DramatisConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Where the roster is stored.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Analytics tuning.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Report layout.
    #[serde(default)]
    pub report: ReportConfig,
}

impl DramatisConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `DramatisError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::DramatisError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level for the host's `tracing` subscriber: trace, debug, info,
    /// warn, error. The library only emits events and never installs a
    /// subscriber; hosts read this value when they set one up.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Storage backend for the roster snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    /// Nothing outlives the process.
    #[default]
    Memory,
    /// A JSON file at `path`.
    Json,
    /// An SQLite database at `path`.
    Sqlite,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Which store to use.
    #[serde(default)]
    pub backend: PersistenceBackend,
    /// File or database path for the `json` and `sqlite` backends.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Store and verify CRC-32 checksums (SQLite only).
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            path: None,
            checksum_enabled: true,
        }
    }
}

/// Analytics tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// How many traits count as dominant.
    #[serde(default = "default_dominant_count")]
    pub dominant_trait_count: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            dominant_trait_count: DEFAULT_DOMINANT_COUNT,
        }
    }
}

/// Report layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Append the relationship network section to the character report.
    #[serde(default)]
    pub include_network: bool,
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_dominant_count() -> usize { DEFAULT_DOMINANT_COUNT }
