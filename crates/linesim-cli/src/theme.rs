//! Console colours.

use colored::Colorize;

/// Styling for everything the console prints.
pub(crate) struct Theme;

impl Theme {
    /// Category headings and the banner.
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", "✓".green())
    }

    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    pub(crate) fn info(text: &str) -> String {
        format!("{} {text}", "i".blue())
    }

    /// Secondary text: time labels, placeholders, counts.
    pub(crate) fn dimmed(text: &str) -> String {
        text.dimmed().to_string()
    }

    /// The sender name above a chat bubble, in LINE green.
    pub(crate) fn sender(text: &str) -> String {
        text.bold().green().to_string()
    }

    /// Rule drawn around a printed transcript.
    pub(crate) fn separator() -> String {
        "─".repeat(40).dimmed().to_string()
    }
}
