//! Scenario and transcript types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time label shown when a message template does not carry one.
pub const DEFAULT_TIME_LABEL: &str = "Just now";

/// Category bucket for scenarios that do not declare one.
pub const UNCATEGORIZED: &str = "未分類";

/// Stable identifier of a scenario within a catalog.
///
/// Catalog sheets emit ids as either strings or numbers; both are normalized
/// to their string form at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub String);

impl ScenarioId {
    /// Create a scenario id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScenarioId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// One scripted step of a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Message text, possibly containing `{name}` placeholders.
    #[serde(default)]
    pub text: Option<String>,
    /// Wait before emission, relative to the previous emission.
    #[serde(default, rename = "delay", alias = "delayMs", alias = "delay_ms")]
    pub delay_ms: u64,
    /// Display label; [`DEFAULT_TIME_LABEL`] when absent.
    #[serde(
        default,
        rename = "timeLabel",
        alias = "time_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_label: Option<String>,
}

impl MessageTemplate {
    /// Create an immediate message with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            delay_ms: 0,
            time_label: None,
        }
    }

    /// Set the delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the display time label.
    #[must_use]
    pub fn with_time_label(mut self, label: impl Into<String>) -> Self {
        self.time_label = Some(label.into());
        self
    }

    /// The label to display, falling back to [`DEFAULT_TIME_LABEL`].
    #[must_use]
    pub fn effective_time_label(&self) -> &str {
        self.time_label_or(DEFAULT_TIME_LABEL)
    }

    /// The label to display, falling back to `fallback` when absent or empty.
    #[must_use]
    pub fn time_label_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.time_label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => fallback,
        }
    }
}

/// A labeled, ordered script of chat messages.
///
/// Immutable once loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable id.
    pub id: ScenarioId,
    /// Display label.
    pub label: String,
    /// Optional grouping category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Messages in authored order.
    #[serde(default)]
    pub messages: Vec<MessageTemplate>,
}

impl Scenario {
    /// Create an empty scenario.
    #[must_use]
    pub fn new(id: impl Into<ScenarioId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: None,
            messages: Vec::new(),
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Append a message.
    #[must_use]
    pub fn with_message(mut self, message: MessageTemplate) -> Self {
        self.messages.push(message);
        self
    }

    /// Category used for grouping; [`UNCATEGORIZED`] when absent or blank.
    #[must_use]
    pub fn effective_category(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }

    /// Sum of all message delays, saturating.
    #[must_use]
    pub fn total_delay_ms(&self) -> u64 {
        self.messages
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.delay_ms))
    }
}

impl From<String> for ScenarioId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a transcript entry. Monotonic within a transcript and never
/// reused, even after the transcript is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// One emitted, resolved chat message.
///
/// The text is frozen at creation; later parameter edits never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unique id.
    pub id: EntryId,
    /// Resolved text with placeholders already substituted.
    pub text: String,
    /// Display time label.
    pub time_label: String,
    /// Scenario that produced this entry.
    pub scenario_id: ScenarioId,
    /// Wall-clock time of emission.
    pub emitted_at: DateTime<Utc>,
}

/// Whether a scenario is currently being played back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No playback in flight; a new one may start.
    #[default]
    Idle,
    /// A playback is in flight; new requests are declined.
    Playing,
}

impl PlaybackState {
    /// Returns `true` when a playback is in flight.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Playing => f.write_str("playing"),
        }
    }
}
