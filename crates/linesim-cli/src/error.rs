//! Error types for the console.

use linesim_catalog::CatalogError;
use linesim_config::ConfigError;
use linesim_core::CoreError;
use linesim_telemetry::TelemetryError;
use thiserror::Error;

use crate::commands::CommandError;

/// Errors produced by the console.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog source could not be built.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A parameter edit was rejected.
    #[error(transparent)]
    Parameter(#[from] CoreError),

    /// A console line could not be parsed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// No scenario with this id is loaded.
    #[error("no scenario with id '{0}' is loaded")]
    UnknownScenario(String),

    /// Reading input or writing output failed.
    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type CliResult<T> = Result<T, CliError>;
