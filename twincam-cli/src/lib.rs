// twincam-cli/src/lib.rs
//
// Library portion of the Twincam CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ProbeArgs, RunArgs};
pub use commands::probe::run_probe;
pub use commands::run::run_job;
