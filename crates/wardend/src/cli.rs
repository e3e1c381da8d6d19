//! CLI argument definitions for the warden daemon.
//!
//! Bare invocation runs in service mode: the manager launches the binary
//! with no arguments. The `install` and `remove` subcommands are operator
//! conveniences that edit the manager database and never touch the lifecycle
//! core. Anything unparsable prints short usage guidance and exits
//! successfully, so a confused manager invocation cannot loop on restarts.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::registrar::StartPolicy;

/// Command-line interface for the warden service host.
#[derive(Parser, Debug)]
#[command(name = "wardend", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Path to a JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    /// Operator subcommands; absent means service mode.
    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

/// Operator subcommands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Registers this binary in the service manager database.
    Install {
        /// When the manager should start the service.
        #[arg(long, value_enum, default_value_t)]
        start_policy: StartPolicy,
        /// Services that must be running first; repeatable.
        #[arg(long = "dependency", value_name = "SERVICE")]
        dependencies: Vec<String>,
        /// Account the service runs under.
        #[arg(long, default_value = "system")]
        account: String,
        /// Credential for the account; accepted but never persisted.
        #[arg(long, hide = true)]
        credential: Option<String>,
    },
    /// Stops the service if needed and removes it from the database.
    Remove,
}

/// Prints the two usage lines shown for unrecognised invocations.
pub(crate) fn write_usage<W: Write>(mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "usage: wardend [--config FILE] [install | remove]")?;
    writeln!(writer, "       wardend with no subcommand runs in service mode")
}
