//! linesim Core - Foundation types for the linesim chat scenario simulator.
//!
//! This crate provides:
//! - The scenario data model ([`Scenario`], [`MessageTemplate`])
//! - Transcript records produced by playback ([`TranscriptEntry`])
//! - The live parameter store read at emission time ([`ParameterStore`])
//! - The placeholder substitution engine ([`template::resolve`])
//!
//! Nothing in here performs I/O. Catalog retrieval lives in
//! `linesim-catalog`, timed playback in `linesim-playback`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod params;
pub mod template;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use params::{ParameterSet, ParameterStore};
pub use types::{
    DEFAULT_TIME_LABEL, EntryId, MessageTemplate, PlaybackState, Scenario, ScenarioId,
    TranscriptEntry, UNCATEGORIZED,
};
