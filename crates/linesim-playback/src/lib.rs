//! Scenario playback for linesim.
//!
//! - [`Player`]: replays one scenario at a time into a transcript sink,
//!   pacing each message by its delay and resolving placeholders at emission
//! - [`Transcript`]: the live, append-only chat record with change
//!   notifications
//! - [`Pacer`]: the cancellable suspension step between messages
//! - [`PlaybackGuard`]: the single-flight lock, released on drop

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::must_use_candidate)]

pub mod guard;
pub mod pacer;
pub mod player;
pub mod transcript;

/// Prelude re-exports for convenient use.
pub mod prelude {
    pub use crate::guard::{PlaybackGuard, PlaybackLock};
    pub use crate::pacer::{PaceOutcome, Pacer, TokioPacer};
    pub use crate::player::{PlayOutcome, PlaybackEvent, Player};
    pub use crate::transcript::{Transcript, TranscriptEvent, TranscriptSink};
}

// Re-export key types at crate root for convenience.
pub use guard::{PlaybackGuard, PlaybackLock};
pub use pacer::{PaceOutcome, Pacer, TokioPacer};
pub use player::{PlayOutcome, PlaybackEvent, Player};
pub use tokio_util::sync::CancellationToken;
pub use transcript::{Transcript, TranscriptEvent, TranscriptSink};
