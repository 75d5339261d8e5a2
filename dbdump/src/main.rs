//! Dump the contents of a MySQL database via mysqldump.

use std::process::ExitCode;

use clap::Command;

use dbdump::{ConsoleCommand, DumpCommand};
use dbdump_core::init_logging;

fn main() -> ExitCode {
    let command = DumpCommand::new();
    let matches = command
        .configure(Command::new("dbdump").version(env!("CARGO_PKG_VERSION")))
        .get_matches();

    if let Err(e) = init_logging(matches.get_count("verbose"), matches.get_flag("quiet")) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match command.execute(&matches) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
