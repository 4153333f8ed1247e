//! Core error types.

use thiserror::Error;

/// Errors raised by the core data model.
///
/// Playback and substitution are infallible; the only fallible core operation
/// is editing the parameter set with a name that could never appear as a
/// `{name}` placeholder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Parameter name is empty.
    #[error("parameter name must not be empty")]
    EmptyParameterName,

    /// Parameter name contains a brace, so no placeholder can reference it.
    #[error("parameter name '{0}' must not contain '{{' or '}}'")]
    InvalidParameterName(String),
}

/// Convenience alias for results using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
