//! Butaca CLI library
//!
//! Command-line front end for the butaca seat-map selector: run a strategy
//! offline against a captured fixture, inspect what a fixture parses to,
//! print the effective configuration, or drive a live page.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormatArg, FormatArg, InspectArgs, PlanArgs,
    RunArgs, StrategyArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_tracing;
pub use output::{render_snapshot_text, Reporter, SelectionReport};
