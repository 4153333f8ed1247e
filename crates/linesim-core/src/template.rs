//! Placeholder substitution.
//!
//! A placeholder is `{name}` where `name` contains no braces. Substitution is
//! a single left-to-right pass: every placeholder whose name is present in the
//! [`ParameterSet`] is replaced by its value, every other placeholder is
//! copied through untouched, and replaced text is never scanned again.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::params::ParameterSet;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("invalid regex"));

/// Resolve `template` against `params`.
///
/// `None` and the empty string both resolve to an empty string. Unknown
/// placeholders are left verbatim, braces included.
#[must_use]
pub fn resolve(template: Option<&str>, params: &ParameterSet) -> String {
    let Some(template) = template else {
        return String::new();
    };
    if params.is_empty() {
        return template.to_owned();
    }

    let replaced: Cow<'_, str> = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match params.get(&caps[1]) {
            Some(value) => value.to_owned(),
            None => caps[0].to_owned(),
        }
    });
    replaced.into_owned()
}

/// Distinct placeholder names in `template`, in order of first appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Placeholder names in `template` that `params` cannot satisfy.
///
/// These resolve to themselves; this is only used for diagnostics.
#[must_use]
pub fn unresolved<'t>(template: &'t str, params: &ParameterSet) -> Vec<&'t str> {
    placeholders(template)
        .into_iter()
        .filter(|name| !params.contains(name))
        .collect()
}
