//! Layered TOML documents with per-field provenance.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User-level configuration (`~/.linesim/config.toml`).
    User,
    /// File passed explicitly on the command line.
    Explicit,
    /// Environment variable fallback.
    Environment,
}

impl ConfigLayer {
    /// Returns `true` for layers backed by a config file.
    pub fn is_file(self) -> bool {
        matches!(self, Self::User | Self::Explicit)
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Defaults => "built-in defaults",
            Self::User => "user config",
            Self::Explicit => "--config file",
            Self::Environment => "environment",
        })
    }
}

/// Dotted field path to the layer that last wrote it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// A TOML document assembled one layer at a time.
///
/// Every leaf remembers the layer that wrote it. Tables merge key by key;
/// scalars and arrays are leaves, so an overlay replaces them whole.
#[derive(Debug, Clone, Default)]
pub struct LayeredDocument {
    root: toml::Table,
    sources: FieldSources,
}

impl LayeredDocument {
    /// Start from `base`, attributing all of it to `layer`.
    pub fn new(base: toml::Table, layer: ConfigLayer) -> Self {
        let mut doc = Self::default();
        doc.overlay(&base, layer);
        doc
    }

    /// Write every leaf of `table` over the document.
    pub fn overlay(&mut self, table: &toml::Table, layer: ConfigLayer) {
        let mut found = Vec::new();
        collect_leaves(table, &mut Vec::new(), &mut found);
        for (segments, value) in found {
            self.write(&segments, value.clone(), layer);
        }
    }

    /// Write one dotted `path`, creating parent tables as needed.
    pub fn set(&mut self, path: &str, value: toml::Value, layer: ConfigLayer) {
        let segments: Vec<&str> = path.split('.').collect();
        self.write(&segments, value, layer);
    }

    /// The layer that last wrote `path`.
    pub fn layer_of(&self, path: &str) -> Option<ConfigLayer> {
        self.sources.get(path).copied()
    }

    /// Value at dotted `path`.
    pub fn get(&self, path: &str) -> Option<&toml::Value> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    /// The merged document and its provenance map.
    pub fn into_parts(self) -> (toml::Table, FieldSources) {
        (self.root, self.sources)
    }

    fn write(&mut self, segments: &[&str], value: toml::Value, layer: ConfigLayer) {
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };
        let mut table = &mut self.root;
        for parent in parents {
            let slot = table
                .entry((*parent).to_owned())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            if !slot.is_table() {
                *slot = toml::Value::Table(toml::Table::new());
            }
            let toml::Value::Table(inner) = slot else {
                return;
            };
            table = inner;
        }
        table.insert((*leaf).to_owned(), value);
        self.sources.insert(segments.join("."), layer);
    }
}

fn collect_leaves<'a>(
    table: &'a toml::Table,
    prefix: &mut Vec<&'a str>,
    out: &mut Vec<(Vec<&'a str>, &'a toml::Value)>,
) {
    for (key, value) in table {
        prefix.push(key);
        match value {
            toml::Value::Table(inner) => collect_leaves(inner, prefix, out),
            leaf => out.push((prefix.clone(), leaf)),
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(s: &str) -> toml::Table {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_replaces_leaves_and_keeps_siblings() {
        let mut doc = LayeredDocument::new(
            table("[catalog]\nurl = \"https://a\"\ntimeout_secs = 30\n"),
            ConfigLayer::Defaults,
        );
        doc.overlay(
            &table("[catalog]\nurl = \"https://b\"\n[parameters]\nuser_name = \"Alice\"\n"),
            ConfigLayer::User,
        );

        assert_eq!(doc.get("catalog.url").and_then(|v| v.as_str()), Some("https://b"));
        assert_eq!(
            doc.get("catalog.timeout_secs").and_then(toml::Value::as_integer),
            Some(30)
        );
        assert_eq!(
            doc.get("parameters.user_name").and_then(|v| v.as_str()),
            Some("Alice")
        );

        assert_eq!(doc.layer_of("catalog.url"), Some(ConfigLayer::User));
        assert_eq!(doc.layer_of("catalog.timeout_secs"), Some(ConfigLayer::Defaults));
        assert_eq!(doc.layer_of("parameters.user_name"), Some(ConfigLayer::User));
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let mut doc = LayeredDocument::new(
            table("[logging]\ndirectives = [\"a=debug\"]\n"),
            ConfigLayer::Defaults,
        );
        doc.overlay(
            &table("[logging]\ndirectives = [\"b=trace\"]\n"),
            ConfigLayer::Explicit,
        );

        let dirs = doc.get("logging.directives").unwrap().as_array().unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].as_str(), Some("b=trace"));
        assert_eq!(doc.layer_of("logging.directives"), Some(ConfigLayer::Explicit));
    }

    #[test]
    fn set_creates_missing_tables() {
        let mut doc = LayeredDocument::default();
        doc.set(
            "logging.directory",
            toml::Value::String("/tmp/logs".to_owned()),
            ConfigLayer::Environment,
        );

        let (root, sources) = doc.into_parts();
        assert_eq!(root["logging"]["directory"].as_str(), Some("/tmp/logs"));
        assert_eq!(sources["logging.directory"], ConfigLayer::Environment);
    }

    #[test]
    fn table_replaces_scalar_in_the_way() {
        let mut doc = LayeredDocument::new(table("catalog = 1\n"), ConfigLayer::Defaults);
        doc.overlay(&table("[catalog]\nurl = \"https://c\"\n"), ConfigLayer::User);
        assert_eq!(doc.get("catalog.url").and_then(|v| v.as_str()), Some("https://c"));
    }

    #[test]
    fn file_layers() {
        assert!(ConfigLayer::User.is_file());
        assert!(ConfigLayer::Explicit.is_file());
        assert!(!ConfigLayer::Defaults.is_file());
        assert!(!ConfigLayer::Environment.is_file());
    }
}
