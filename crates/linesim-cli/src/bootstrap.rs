//! Turning loaded configuration into a running session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use linesim_catalog::{CatalogSource, FileCatalog, HttpCatalog};
use linesim_config::{CatalogEnvironment, CatalogSection, Config, ConfigError};
use linesim_core::ParameterSet;
use linesim_telemetry::{FileRotation, LogConfig, LogFormat};

use crate::error::CliResult;
use crate::simulator::Simulator;

/// Command-line values that take precedence over every config layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Endpoint for the selected environment. Clears any catalog file.
    pub catalog_url: Option<String>,
    /// Local catalog file.
    pub catalog_file: Option<PathBuf>,
    /// `production` or `development`.
    pub environment: Option<String>,
    /// Base log filter.
    pub log_level: Option<String>,
    /// Log format name.
    pub log_format: Option<String>,
}

/// Apply command-line overrides and re-validate.
pub fn apply_overrides(config: &mut Config, overrides: &Overrides) -> CliResult<()> {
    if let Some(environment) = &overrides.environment {
        config.catalog.environment.clone_from(environment);
    }
    if let Some(url) = &overrides.catalog_url {
        match config.catalog.selected_environment() {
            Some(CatalogEnvironment::Development) => config.catalog.dev_url.clone_from(url),
            _ => config.catalog.url.clone_from(url),
        }
        config.catalog.file = None;
    }
    if let Some(file) = &overrides.catalog_file {
        config.catalog.file = Some(file.clone());
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = &overrides.log_format {
        config.logging.format.clone_from(format);
    }
    linesim_config::validate::validate(config)?;
    Ok(())
}

/// Logging settings for the configured `[logging]` section.
pub fn log_config(config: &Config) -> CliResult<LogConfig> {
    let logging = &config.logging;
    let format: LogFormat = logging.format.parse()?;
    let mut log = LogConfig::new(logging.level.clone())
        .with_format(format)
        .with_directives(logging.directives.iter().cloned());
    if let Some(dir) = &logging.directory {
        log = log.with_file_logging(dir.clone(), logging.rotation.parse::<FileRotation>()?);
    }
    if logging.file_info {
        log = log.with_file_info();
    }
    Ok(log)
}

/// The catalog source selected by `[catalog]`.
pub fn catalog_source(section: &CatalogSection) -> CliResult<Arc<dyn CatalogSource>> {
    if let Some(path) = &section.file {
        return Ok(Arc::new(FileCatalog::new(path.clone())));
    }
    let url = section
        .endpoint()
        .ok_or_else(|| ConfigError::ValidationError {
            field: "catalog.environment".to_owned(),
            message: format!("unknown environment '{}'", section.environment),
        })?;
    let timeout = Duration::from_secs(section.timeout_secs);
    Ok(Arc::new(HttpCatalog::new(url, timeout)?))
}

/// Initial parameters from `[parameters]`.
pub fn initial_parameters(config: &Config) -> ParameterSet {
    config
        .parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Build a session from a validated configuration.
pub fn build_simulator(config: &Config) -> CliResult<Simulator> {
    let source = catalog_source(&config.catalog)?;
    Ok(Simulator::new(source, initial_parameters(config))
        .with_default_time_label(config.playback.default_time_label.clone()))
}
