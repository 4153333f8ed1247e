//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{CatalogEnvironment, Config};

/// Recognised `logging.format` values.
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "never"];

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_catalog(config)?;
    validate_parameters(config)?;
    validate_playback(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_catalog(config: &Config) -> ConfigResult<()> {
    let c = &config.catalog;

    let Some(environment) = c.selected_environment() else {
        return Err(invalid(
            "catalog.environment",
            format!(
                "unknown environment '{}'; expected production or development",
                c.environment
            ),
        ));
    };

    if c.timeout_secs == 0 {
        return Err(invalid("catalog.timeout_secs", "must be greater than zero"));
    }

    // A local file replaces the endpoint entirely.
    if c.file.is_some() {
        return Ok(());
    }

    let (field, url) = match environment {
        CatalogEnvironment::Production => ("catalog.url", &c.url),
        CatalogEnvironment::Development => ("catalog.dev_url", &c.dev_url),
    };
    if url.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(invalid(
            field,
            format!("unsupported scheme '{}'", parsed.scheme()),
        )),
        Err(e) => Err(invalid(field, format!("invalid URL: {e}"))),
    }
}

fn validate_parameters(config: &Config) -> ConfigResult<()> {
    for name in config.parameters.keys() {
        if name.trim().is_empty() || name.contains(['{', '}']) {
            return Err(invalid(
                format!("parameters.{name}"),
                "parameter names must be non-empty and contain no braces",
            ));
        }
    }
    Ok(())
}

fn validate_playback(config: &Config) -> ConfigResult<()> {
    if config.playback.default_time_label.trim().is_empty() {
        return Err(invalid("playback.default_time_label", "must not be empty"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let format = config.logging.format.as_str();
    if !LOG_FORMATS.contains(&format) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{format}'; expected one of: {}",
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    if config.logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "must not be empty"));
    }
    let rotation = config.logging.rotation.as_str();
    if !LOG_ROTATIONS.contains(&rotation) {
        return Err(invalid(
            "logging.rotation",
            format!(
                "unknown rotation '{rotation}'; expected one of: {}",
                LOG_ROTATIONS.join(", ")
            ),
        ));
    }
    if config
        .logging
        .directory
        .as_ref()
        .is_some_and(|d| d.as_os_str().is_empty())
    {
        return Err(invalid("logging.directory", "must not be empty when set"));
    }
    Ok(())
}
