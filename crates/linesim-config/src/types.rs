//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Production script endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://script.google.com/macros/s/AKfycbz4ZJnDoHTYPIG1Hy4TQz6lbkC71qhbJOPPIRuJVHNNyCCjXSwaZEy7nBK2E_RLB2xC/exec";

/// Local development proxy for the same script.
pub const DEFAULT_DEV_CATALOG_URL: &str = "http://localhost:5173/api/gas";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where scenarios come from.
    pub catalog: CatalogSection,
    /// Initial template parameter values.
    pub parameters: BTreeMap<String, String>,
    /// Playback presentation.
    pub playback: PlaybackSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// CatalogSection
// ---------------------------------------------------------------------------

/// Which endpoint the catalog is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEnvironment {
    /// The deployed script URL.
    Production,
    /// The local development proxy.
    Development,
}

impl CatalogEnvironment {
    /// Parse a configured environment name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Catalog source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Production endpoint.
    pub url: String,
    /// Development endpoint.
    pub dev_url: String,
    /// `"production"` or `"development"`.
    pub environment: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Local JSON file used instead of either endpoint.
    pub file: Option<PathBuf>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_owned(),
            dev_url: DEFAULT_DEV_CATALOG_URL.to_owned(),
            environment: "production".to_owned(),
            timeout_secs: 30,
            file: None,
        }
    }
}

impl CatalogSection {
    /// The selected environment, or `None` if the name is not recognised.
    pub fn selected_environment(&self) -> Option<CatalogEnvironment> {
        CatalogEnvironment::parse(&self.environment)
    }

    /// Endpoint URL for the selected environment.
    pub fn endpoint(&self) -> Option<&str> {
        match self.selected_environment()? {
            CatalogEnvironment::Production => Some(&self.url),
            CatalogEnvironment::Development => Some(&self.dev_url),
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackSection
// ---------------------------------------------------------------------------

/// Playback presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSection {
    /// Label shown for messages without a `timeLabel`.
    pub default_time_label: String,
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            default_time_label: "Just now".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base filter, either a level (`"info"`) or a full filter string
    /// (`"warn,linesim=info"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Extra per-crate directives (e.g. `["linesim_playback=debug"]`).
    pub directives: Vec<String>,
    /// Write logs to rolling files in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    /// File rotation: `"daily"`, `"hourly"` or `"never"`.
    pub rotation: String,
    /// Include source file and line in each record.
    pub file_info: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn,linesim=info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
            rotation: "daily".to_owned(),
            file_info: false,
        }
    }
}
