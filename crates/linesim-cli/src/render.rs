//! Text rendering for console output.
//!
//! Every function returns a `String`; printing is the caller's job.

use std::fmt::Write as _;

use linesim_catalog::{CategoryGroup, RefreshReport};
use linesim_core::{ParameterSet, PlaybackState, TranscriptEntry};
use linesim_playback::PlayOutcome;

use crate::theme::Theme;

/// Sender name used when `shop_name` is not set.
pub const FALLBACK_SENDER: &str = "LINE";

/// Startup banner.
pub fn banner() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        "{}\n{}",
        Theme::header(&format!("linesim v{version}")),
        Theme::dimmed("LINE chat scenario simulator")
    )
}

/// One chat bubble: sender and time label on the first line, text below.
pub fn entry(entry: &TranscriptEntry, sender: &str) -> String {
    let mut out = format!(
        "{}  {}",
        Theme::sender(sender),
        Theme::dimmed(&entry.time_label)
    );
    for line in entry.text.lines() {
        let _ = write!(out, "\n  {line}");
    }
    if entry.text.is_empty() {
        out.push_str("\n  ");
    }
    out
}

/// The whole transcript, or a placeholder when empty.
pub fn transcript(entries: &[TranscriptEntry], sender: &str) -> String {
    if entries.is_empty() {
        return Theme::dimmed("(no messages)");
    }
    entries
        .iter()
        .map(|e| entry(e, sender))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indicator shown while a playback is in flight.
pub fn typing(sender: &str) -> String {
    Theme::dimmed(&format!("{sender} is typing..."))
}

/// Command prompt, flagging an in-flight playback.
pub fn prompt(state: PlaybackState) -> &'static str {
    if state.is_playing() {
        "linesim (typing...)> "
    } else {
        "linesim> "
    }
}

/// Parameters sorted by name.
pub fn parameters(params: &ParameterSet) -> String {
    if params.is_empty() {
        return Theme::dimmed("(no parameters)");
    }
    let width = params
        .sorted_names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    params
        .sorted_names()
        .into_iter()
        .map(|name| {
            format!(
                "  {name:<width$}  {}",
                params.get(name).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scenarios grouped by category.
pub fn catalog(groups: &[CategoryGroup]) -> String {
    if groups.is_empty() {
        return Theme::dimmed("(no scenarios loaded)");
    }
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&Theme::header(&group.name));
        for scenario in &group.scenarios {
            let _ = write!(
                out,
                "\n  {}  {} {}",
                scenario.id,
                scenario.label,
                Theme::dimmed(&format!("({} messages)", scenario.messages.len()))
            );
        }
    }
    out
}

/// Outcome of a catalog refresh, including each rejected entry.
pub fn refresh_report(report: &RefreshReport) -> String {
    if let Some(error) = &report.error {
        return Theme::error(&format!("catalog unavailable: {error}"));
    }
    let mut out = Theme::success(&format!("loaded {} scenarios", report.loaded));
    for rejected in &report.rejected {
        out.push('\n');
        out.push_str(&Theme::warning(&format!("skipped {rejected}")));
    }
    out
}

/// How a playback ended.
pub fn outcome(outcome: PlayOutcome) -> String {
    match outcome {
        PlayOutcome::Completed { emitted } => {
            Theme::dimmed(&format!("playback finished ({emitted} messages)"))
        },
        PlayOutcome::Cancelled { emitted } => {
            Theme::warning(&format!("playback stopped after {emitted} messages"))
        },
        PlayOutcome::Declined => Theme::warning("a scenario is already playing"),
    }
}

/// Session status summary.
pub fn status(
    state: PlaybackState,
    transcript_len: usize,
    scenarios: usize,
    loading: bool,
    source: &str,
) -> String {
    let catalog = if loading {
        "loading...".to_string()
    } else {
        format!("{scenarios} scenarios")
    };
    [
        format!("  playback    {state}"),
        format!("  transcript  {transcript_len} messages"),
        format!("  catalog     {catalog}"),
        format!("  source      {source}"),
    ]
    .join("\n")
}

/// Result of checking a scenario for unresolved placeholders.
pub fn check(id: &str, missing: &[String]) -> String {
    if missing.is_empty() {
        Theme::success(&format!("'{id}' resolves completely"))
    } else {
        let names = missing
            .iter()
            .map(|n| format!("{{{n}}}"))
            .collect::<Vec<_>>()
            .join(", ");
        Theme::warning(&format!("'{id}' leaves unresolved: {names}"))
    }
}
