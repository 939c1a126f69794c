//! Command-line driver for remote device cloud sessions.

/// Argument parsing.
pub mod cli;
/// Subcommand implementations.
pub mod commands;
/// Tracing setup.
pub mod logging;
