//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Runs one dual-camera job and reports its progress.
pub mod run;

/// Probes two recordings and shows the padding decision.
pub mod probe;
