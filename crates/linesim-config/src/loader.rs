//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user file (`$LINESIM_HOME/config.toml` or `~/.linesim/config.toml`)
//! 3. Merge the explicit `--config` file, which must exist
//! 4. Apply `LINESIM_*` env var fallbacks for fields no file set
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, LayeredDocument};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory under the home directory holding the user config.
const USER_DIR: &str = ".linesim";

/// A loaded configuration plus where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Layer that set each dotted field path.
    pub field_sources: FieldSources,
    /// Config files that were merged, in order.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Layer that set `field`, if known.
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }
}

/// Load configuration with the full precedence chain, reading the process
/// environment.
///
/// `home_override` is treated as the `.linesim` directory itself.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, an env var
/// cannot be applied, or the merged configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, home_override, &collect_env_vars())
}

/// Like [`load`] but with an explicit environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    explicit: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let defaults: toml::Table =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut doc = LayeredDocument::new(defaults, ConfigLayer::Defaults);
    let mut loaded_files = Vec::new();

    let user_path = user_config_path(home_override, env_vars)?;
    if let Some(table) = try_load_file(&user_path)? {
        doc.overlay(&table, ConfigLayer::User);
        info!(path = %user_path.display(), "loaded user config");
        loaded_files.push(user_path.display().to_string());
    }

    // Unlike the user file, an explicit file must exist.
    if let Some(path) = explicit {
        let table = try_load_file(path)?.ok_or_else(|| not_found(path))?;
        doc.overlay(&table, ConfigLayer::Explicit);
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path.display().to_string());
    }

    let applied = apply_env_fallbacks(&mut doc, env_vars)?;
    if applied > 0 {
        debug!(count = applied, "applied environment variable fallbacks");
    }

    let (root, field_sources) = doc.into_parts();
    let config = deserialize(root, "<merged config>")?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a single file (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let table = try_load_file(path)?.ok_or_else(|| not_found(path))?;
    let config = deserialize(table, &path.display().to_string())?;
    validate::validate(&config)?;
    Ok(config)
}

fn deserialize(table: toml::Table, origin: &str) -> ConfigResult<Config> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: origin.to_owned(),
            source: e,
        })
}

fn not_found(path: &Path) -> ConfigError {
    ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
    }
}

fn user_config_path<S: ::std::hash::BuildHasher>(
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<PathBuf> {
    if let Some(dir) = home_override {
        return Ok(dir.join("config.toml"));
    }
    if let Some(dir) = env_vars.get("LINESIM_HOME").filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir).join("config.toml"));
    }
    Ok(home_directory()?.join(USER_DIR).join("config.toml"))
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Table>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
