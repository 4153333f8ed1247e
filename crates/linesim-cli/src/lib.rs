//! linesim console - operator facade and interactive front end.
//!
//! - [`Simulator`]: one session: parameters, transcript, player and catalog
//! - [`Console`]: line-oriented command loop with live chat rendering
//! - [`bootstrap`]: configuration to session wiring

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bootstrap;
pub mod commands;
pub mod console;
pub mod error;
pub mod render;
pub mod simulator;
mod theme;

pub use commands::{Command, CommandError};
pub use console::{Console, Flow, SharedOutput};
pub use error::{CliError, CliResult};
pub use simulator::Simulator;
