//! Prelude module - commonly used types for convenient import.
//!
//! Use `use linesim_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Scenario model
pub use crate::{DEFAULT_TIME_LABEL, MessageTemplate, Scenario, ScenarioId, UNCATEGORIZED};

// Playback output
pub use crate::{EntryId, PlaybackState, TranscriptEntry};

// Parameters
pub use crate::{ParameterSet, ParameterStore};

// Substitution
pub use crate::template::{placeholders, resolve, unresolved};
