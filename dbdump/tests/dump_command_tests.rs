//! End-to-end tests for the dump command, substituting benign binaries for
//! mysqldump where a real invocation is needed.

use std::io::Write;
use std::path::Path;

use clap::Command;
use dbdump::{ConsoleCommand, DumpCommand};
use dbdump_core::{AppConfig, DatabaseConfig};

fn test_config(storage_root: &Path) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            host: "localhost".to_string(),
            database: "forum".to_string(),
            port: None,
            username: "root".to_string(),
            password: String::new(),
        },
        storage_path: storage_root.to_path_buf(),
    }
}

fn parse(command: &DumpCommand, argv: &[&str]) -> clap::ArgMatches {
    command
        .configure(Command::new("dbdump"))
        .try_get_matches_from(argv)
        .expect("argv should parse")
}

#[test]
fn unknown_option_is_rejected_at_parse_time() {
    let command = DumpCommand::new();
    let result = command
        .configure(Command::new("dbdump"))
        .try_get_matches_from(["dbdump", "--totally-unknown-option"]);

    assert!(result.is_err());
}

#[test]
fn whitelisted_option_parses_bare_and_valued() {
    let command = DumpCommand::new();

    let matches = parse(
        &command,
        &["dbdump", "--single-transaction", "--where=id>100"],
    );
    assert_eq!(
        matches.get_one::<String>("single-transaction").map(String::as_str),
        Some("")
    );
    assert_eq!(
        matches.get_one::<String>("where").map(String::as_str),
        Some("id>100")
    );
    assert_eq!(matches.get_one::<String>("quick"), None);
}

#[cfg(unix)]
#[test]
fn successful_dump_reports_exit_code_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &["dbdump", output_str, "--binary-path", "/bin/echo"],
    );

    assert_eq!(command.execute(&matches).unwrap(), 0);

    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.starts_with("--host=localhost --port=3306 --user=root"));
    assert!(contents.contains("forum"));
}

#[cfg(unix)]
#[test]
fn bare_and_valued_passthrough_reach_the_binary() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &[
            "dbdump",
            output_str,
            "--binary-path",
            "/bin/echo",
            "--single-transaction",
            "--where=id>100",
        ],
    );

    assert_eq!(command.execute(&matches).unwrap(), 0);

    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.contains("--single-transaction"));
    assert!(contents.contains("--where=id>100"));
}

#[cfg(unix)]
#[test]
fn passthrough_options_follow_whitelist_order_not_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    // "where" supplied before "quick", but "quick" precedes it in the whitelist
    let matches = parse(
        &command,
        &[
            "dbdump",
            output_str,
            "--binary-path",
            "/bin/echo",
            "--where=id>100",
            "--quick",
        ],
    );

    assert_eq!(command.execute(&matches).unwrap(), 0);

    let contents = std::fs::read_to_string(&output).unwrap();
    let quick = contents.find("--quick").unwrap();
    let filter = contents.find("--where=id>100").unwrap();
    assert!(quick < filter);
}

#[cfg(unix)]
#[test]
fn compressed_dump_gets_double_extension_and_gzip_output() {
    let dir = tempfile::tempdir().unwrap();
    let supplied = dir.path().join("dump.sql");
    let supplied_str = supplied.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &[
            "dbdump",
            supplied_str,
            "--compress",
            "gz",
            "--binary-path",
            "/bin/echo",
        ],
    );

    assert_eq!(command.execute(&matches).unwrap(), 0);

    let resolved = dir.path().join("dump.sql.gz");
    let bytes = std::fs::read(&resolved).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    assert!(!supplied.exists());
}

#[test]
fn missing_binary_yields_exit_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &[
            "dbdump",
            output_str,
            "--binary-path",
            "/nonexistent/mysqldump",
        ],
    );

    assert_eq!(command.execute(&matches).unwrap(), 1);
}

#[cfg(unix)]
#[test]
fn failed_dump_leaves_partial_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &["dbdump", output_str, "--binary-path", "/bin/false"],
    );

    assert_eq!(command.execute(&matches).unwrap(), 1);
    // No cleanup on failure; the empty file remains
    assert!(output.exists());
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
}

#[test]
fn include_exclude_conflict_propagates_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::with_config(test_config(dir.path()));
    let matches = parse(
        &command,
        &[
            "dbdump",
            output_str,
            "--include-tables",
            "users",
            "--exclude-tables",
            "sessions",
        ],
    );

    assert!(command.execute(&matches).is_err());
}

#[cfg(unix)]
#[test]
fn config_file_supplies_connection_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let config_path = dir.path().join("dbdump.json");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"{{"database": {{"host": "db.internal", "database": "forum", "port": 3307, "username": "backup"}}}}"#
    )
    .unwrap();

    let command = DumpCommand::new();
    let matches = parse(
        &command,
        &[
            "dbdump",
            output_str,
            "--config",
            config_path.to_str().unwrap(),
            "--binary-path",
            "/bin/echo",
        ],
    );

    assert_eq!(command.execute(&matches).unwrap(), 0);

    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.starts_with("--host=db.internal --port=3307 --user=backup"));
}

#[test]
fn missing_config_file_propagates_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("dump.sql");
    let output_str = output.to_str().unwrap();

    let command = DumpCommand::new();
    let matches = parse(
        &command,
        &["dbdump", output_str, "--config", "/nonexistent/dbdump.json"],
    );

    assert!(command.execute(&matches).is_err());
}
