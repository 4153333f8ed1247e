//! Shared test utilities for linesim.
//!
//! Fixtures build the scenarios and parameters used across integration
//! tests; mocks stand in for the catalog endpoint and the transcript.
//!
//! ```toml
//! [dev-dependencies]
//! linesim-test.workspace = true
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![allow(clippy::must_use_candidate)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
