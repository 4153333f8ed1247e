//! Logging setup for linesim.
//!
//! # Example
//!
//! ```rust,no_run
//! use linesim_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), linesim_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("linesim_playback=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    DEFAULT_FILTER, FileRotation, LogConfig, LogFormat, LogTarget, setup_logging,
};
