//! Command wiring for the dbdump binary.
//!
//! Exposed as a library so integration tests can drive the command exactly
//! the way `main` does.

pub mod command;
pub mod dump_command;

pub use command::ConsoleCommand;
pub use dump_command::DumpCommand;
