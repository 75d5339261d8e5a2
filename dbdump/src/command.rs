//! Runnable command capability.

use clap::ArgMatches;
use dbdump_core::Result;

/// A command that registers its arguments on a clap registrar and runs
/// against the parsed matches.
pub trait ConsoleCommand {
    /// Registers the command's arguments and help text.
    fn configure(&self, command: clap::Command) -> clap::Command;

    /// Executes the command, returning the process exit code.
    ///
    /// # Errors
    /// Returns an error for misconfiguration the command does not handle
    /// itself; handled runtime failures are expressed through the exit code.
    fn execute(&self, matches: &ArgMatches) -> Result<i32>;
}
