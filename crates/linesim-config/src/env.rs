//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, LayeredDocument};

/// Prefix shared by every variable the loader reads.
pub const ENV_PREFIX: &str = "LINESIM_";

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "LINESIM_CATALOG_URL",
        field_path: "catalog.url",
    },
    EnvMapping {
        var_name: "LINESIM_CATALOG_DEV_URL",
        field_path: "catalog.dev_url",
    },
    EnvMapping {
        var_name: "LINESIM_ENV",
        field_path: "catalog.environment",
    },
    EnvMapping {
        var_name: "LINESIM_CATALOG_TIMEOUT_SECS",
        field_path: "catalog.timeout_secs",
    },
    EnvMapping {
        var_name: "LINESIM_CATALOG_FILE",
        field_path: "catalog.file",
    },
    // Initial template parameters.
    EnvMapping {
        var_name: "LINESIM_SHOP_NAME",
        field_path: "parameters.shop_name",
    },
    EnvMapping {
        var_name: "LINESIM_USER_NAME",
        field_path: "parameters.user_name",
    },
    EnvMapping {
        var_name: "LINESIM_PRODUCT_NAME",
        field_path: "parameters.product_name",
    },
    EnvMapping {
        var_name: "LINESIM_DEFAULT_TIME_LABEL",
        field_path: "playback.default_time_label",
    },
    EnvMapping {
        var_name: "LINESIM_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "LINESIM_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "LINESIM_LOG_DIR",
        field_path: "logging.directory",
    },
];

/// Fields whose env value must be coerced to an integer.
const INTEGER_FIELDS: &[&str] = &["catalog.timeout_secs"];

/// Snapshot the process environment, keeping only `LINESIM_*` variables.
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Fill fields that no config file set from `LINESIM_*` variables.
///
/// Blank values are skipped. Returns how many variables were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a value cannot be coerced to the
/// field's type.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    doc: &mut LayeredDocument,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if doc.layer_of(mapping.field_path).is_some_and(ConfigLayer::is_file) {
            continue;
        }
        let Some(val) = env_vars
            .get(mapping.var_name)
            .filter(|v| !v.trim().is_empty())
        else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "env fallback applied"
        );
        doc.set(
            mapping.field_path,
            coerce(mapping, val)?,
            ConfigLayer::Environment,
        );
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, val: &str) -> ConfigResult<toml::Value> {
    if INTEGER_FIELDS.contains(&mapping.field_path) {
        let n: i64 = val.trim().parse().map_err(|_| ConfigError::EnvError {
            var_name: mapping.var_name.to_owned(),
            message: format!("expected an integer, got '{val}'"),
        })?;
        Ok(toml::Value::Integer(n))
    } else {
        Ok(toml::Value::String(val.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn doc(toml_src: &str, layer: ConfigLayer) -> LayeredDocument {
        LayeredDocument::new(toml::from_str(toml_src).unwrap(), layer)
    }

    #[test]
    fn fills_fields_left_at_defaults() {
        let mut merged = doc("[catalog]\nurl = \"https://a\"\n", ConfigLayer::Defaults);
        let env = vars(&[
            ("LINESIM_CATALOG_URL", "https://env"),
            ("LINESIM_USER_NAME", "Alice"),
            ("LINESIM_CATALOG_TIMEOUT_SECS", "5"),
        ]);

        assert_eq!(apply_env_fallbacks(&mut merged, &env).unwrap(), 3);
        assert_eq!(
            merged.get("catalog.url").and_then(|v| v.as_str()),
            Some("https://env")
        );
        assert_eq!(
            merged.get("catalog.timeout_secs").and_then(toml::Value::as_integer),
            Some(5)
        );
        assert_eq!(
            merged.get("parameters.user_name").and_then(|v| v.as_str()),
            Some("Alice")
        );
        assert_eq!(
            merged.layer_of("parameters.user_name"),
            Some(ConfigLayer::Environment)
        );
    }

    #[test]
    fn file_values_win_over_env() {
        let mut merged = doc("[catalog]\nurl = \"https://file\"\n", ConfigLayer::User);
        let env = vars(&[("LINESIM_CATALOG_URL", "https://env")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &env).unwrap(), 0);
        assert_eq!(
            merged.get("catalog.url").and_then(|v| v.as_str()),
            Some("https://file")
        );
    }

    #[test]
    fn log_directory_fallback() {
        let mut merged = LayeredDocument::default();
        let env = vars(&[("LINESIM_LOG_DIR", "/var/log/linesim")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &env).unwrap(), 1);
        assert_eq!(
            merged.get("logging.directory").and_then(|v| v.as_str()),
            Some("/var/log/linesim")
        );
    }

    #[test]
    fn bad_integer_is_an_error() {
        let mut merged = LayeredDocument::default();
        let env = vars(&[("LINESIM_CATALOG_TIMEOUT_SECS", "soon")]);

        let err = apply_env_fallbacks(&mut merged, &env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "LINESIM_CATALOG_TIMEOUT_SECS"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let mut merged = LayeredDocument::default();
        let env = vars(&[("LINESIM_ENV", "  ")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &env).unwrap(), 0);
    }
}
