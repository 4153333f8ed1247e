use std::io;

use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read, or an explicit file is
    /// missing.
    #[error("cannot read config file {path}: {source}")]
    ReadError {
        /// Path to the config file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML or has the wrong shape.
    #[error("invalid config file {path}: {source}")]
    ParseError {
        /// Path to the config file that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The merged configuration is well-formed but unusable.
    #[error("config field '{field}': {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// Validation failure description.
        message: String,
    },

    /// A `LINESIM_*` variable could not be applied.
    #[error("{var_name}: {message}")]
    EnvError {
        /// Variable name.
        var_name: String,
        /// What was wrong with its value.
        message: String,
    },

    /// Neither `LINESIM_HOME` nor a home directory is available.
    #[error("no home directory; set LINESIM_HOME")]
    NoHomeDir,
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
