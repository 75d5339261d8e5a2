//! The `dbdump` command: translate CLI input into a configured mysqldump
//! invocation and execute it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::{Arg, ArgAction, ArgMatches};
use tracing::{error, info};

use dbdump_core::{
    AppConfig, Compression, DumpError, MysqlDumper, Result, human_readable_size,
    ALLOWED_MYSQLDUMP_OPTIONS,
};

use crate::command::ConsoleCommand;

/// The database dump command.
pub struct DumpCommand {
    config: Option<AppConfig>,
}

impl DumpCommand {
    /// Creates a command that loads its configuration from the `--config`
    /// file at execution time.
    #[must_use]
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Creates a command with an externally supplied configuration.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn load_config(&self, matches: &ArgMatches) -> Result<AppConfig> {
        if let Some(config) = &self.config {
            return Ok(config.clone());
        }

        let path = matches
            .get_one::<String>("config")
            .map_or_else(|| Path::new("dbdump.json"), Path::new);
        AppConfig::load(path)
    }

    fn build_dumper(config: &AppConfig, matches: &ArgMatches) -> Result<MysqlDumper> {
        let db = &config.database;
        let mut dumper = MysqlDumper::new()
            .with_host(db.host.as_str())
            .with_db_name(db.database.as_str())
            .with_port(db.port.unwrap_or(3306))
            .with_username(db.username.as_str())
            .with_password(db.password.as_str());

        if let Some(binary_path) = matches.get_one::<String>("binary-path") {
            dumper = dumper.with_dump_binary_path(binary_path);
        }

        if let Some(tables) = matches.get_one::<String>("include-tables") {
            dumper = dumper.include_tables(split_table_list(tables))?;
        }

        if let Some(tables) = matches.get_one::<String>("exclude-tables") {
            dumper = dumper.exclude_tables(split_table_list(tables))?;
        }

        if matches.get_flag("skip-structure") {
            dumper = dumper.skip_table_structure();
        }

        if matches.get_flag("no-data") {
            dumper = dumper.skip_data();
        }

        if matches.get_flag("skip-auto-increment") {
            dumper = dumper.skip_auto_increment();
        }

        if matches.get_flag("no-column-statistics") {
            dumper = dumper.skip_column_statistics();
        }

        // Whitelist declaration order, not input order
        for option in ALLOWED_MYSQLDUMP_OPTIONS {
            if let Some(value) = matches.get_one::<String>(option) {
                dumper = if value.is_empty() {
                    dumper.add_extra_option(format!("--{option}"))
                } else {
                    dumper.add_extra_option(format!("--{option}={value}"))
                };
            }
        }

        Ok(dumper)
    }
}

impl Default for DumpCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleCommand for DumpCommand {
    fn configure(&self, command: clap::Command) -> clap::Command {
        let mut command = command
            .about("Dump the contents of a database")
            .arg(
                Arg::new("path")
                    .value_name("PATH")
                    .help("Path where to store the dump file"),
            )
            .arg(
                Arg::new("compress")
                    .long("compress")
                    .value_name("TYPE")
                    .value_parser(["gz", "bz2"])
                    .help("Compression type (gz, bz2)"),
            )
            .arg(
                Arg::new("binary-path")
                    .long("binary-path")
                    .value_name("PATH")
                    .help("Custom location for the mysqldump binary"),
            )
            .arg(
                Arg::new("include-tables")
                    .long("include-tables")
                    .value_name("TABLES")
                    .help("Comma separated list of tables to include in the dump"),
            )
            .arg(
                Arg::new("exclude-tables")
                    .long("exclude-tables")
                    .value_name("TABLES")
                    .help("Comma separated list of tables to exclude from the dump"),
            )
            .arg(
                Arg::new("skip-structure")
                    .long("skip-structure")
                    .action(ArgAction::SetTrue)
                    .help("Skip table structure (CREATE TABLE statements)"),
            )
            .arg(
                Arg::new("no-data")
                    .long("no-data")
                    .action(ArgAction::SetTrue)
                    .help("Do not write row data"),
            )
            .arg(
                Arg::new("skip-auto-increment")
                    .long("skip-auto-increment")
                    .action(ArgAction::SetTrue)
                    .help("Skip AUTO_INCREMENT values from the dump"),
            )
            .arg(
                Arg::new("no-column-statistics")
                    .long("no-column-statistics")
                    .action(ArgAction::SetTrue)
                    .help("Do not use column statistics (for MySQL 8 compatibility with older versions)"),
            )
            .arg(
                Arg::new("config")
                    .long("config")
                    .value_name("FILE")
                    .env("DBDUMP_CONFIG")
                    .default_value("dbdump.json")
                    .help("Path to the JSON configuration file"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Increase verbosity (-v, -vv)"),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .help("Suppress all output except errors"),
            );

        for option in ALLOWED_MYSQLDUMP_OPTIONS {
            command = command.arg(
                Arg::new(option)
                    .long(option)
                    .num_args(0..=1)
                    .require_equals(true)
                    .default_missing_value("")
                    .value_name("VALUE")
                    .help(format!("Pass --{option} to mysqldump")),
            );
        }

        command
    }

    fn execute(&self, matches: &ArgMatches) -> Result<i32> {
        let config = self.load_config(matches)?;
        let dumper = Self::build_dumper(&config, matches)?;

        let compression = matches
            .get_one::<String>("compress")
            .and_then(|value| Compression::from_extension(value));

        let supplied = matches.get_one::<String>("path").map(String::as_str);
        let path = resolve_path(supplied, compression, &config.storage_path, Local::now());

        let compressor = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Compression::from_extension);

        ensure_directory(&path)?;

        info!("Dumping database {} to {}", config.database, path.display());

        match dump_and_report(&dumper, &path, compressor) {
            Ok(()) => Ok(0),
            Err(e) => {
                error!("Dump failed: {e}");
                eprintln!("Failed to dump database: {e}");
                Ok(1)
            }
        }
    }
}

/// Runs the dump and reports the produced file on success.
fn dump_and_report(
    dumper: &MysqlDumper,
    path: &Path,
    compression: Option<Compression>,
) -> Result<()> {
    dumper.dump_to_file(path, compression)?;

    let full_path = std::fs::canonicalize(path)
        .map_err(|e| DumpError::io(format!("Failed to resolve {}", path.display()), e))?;
    let size = std::fs::metadata(&full_path)
        .map_err(|e| DumpError::io(format!("Failed to stat {}", full_path.display()), e))?
        .len();

    println!(
        "Database dumped successfully to: {} ({})",
        full_path.display(),
        human_readable_size(size)
    );

    Ok(())
}

/// Resolves the destination path for the dump file.
///
/// An omitted path defaults to a timestamped file under the storage root.
/// When a compression type is requested and differs from the current final
/// extension, that type is appended; a resulting double extension such as
/// `dump.sql.gz` is intentional. A path with no extension gets `.sql`. The
/// returned path always carries a non-empty extension.
fn resolve_path(
    supplied: Option<&str>,
    compression: Option<Compression>,
    storage_root: &Path,
    now: DateTime<Local>,
) -> PathBuf {
    let mut path = match supplied {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => format!(
            "{}/dumps/dump-{}.sql",
            storage_root.display(),
            now.format("%Y-%m-%d-%H%M%S")
        ),
    };

    let extension = final_extension(&path);
    if let Some(compression) = compression {
        if extension.as_deref() != Some(compression.extension()) {
            path.push('.');
            path.push_str(compression.extension());
        }
    } else if extension.is_none() {
        path.push_str(".sql");
    }

    PathBuf::from(path)
}

fn final_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .filter(|extension| !extension.is_empty())
        .map(ToString::to_string)
}

/// Creates all missing parent directories of `path`. Idempotent.
fn ensure_directory(path: &Path) -> Result<()> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };

    create_dir_recursive(dir)
        .map_err(|e| DumpError::io(format!("Failed to create directory {}", dir.display()), e))
}

#[cfg(unix)]
fn create_dir_recursive(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dir_recursive(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

fn split_table_list(tables: &str) -> Vec<String> {
    tables.split(',').map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 13, 45, 9).unwrap()
    }

    #[test]
    fn test_explicit_path_with_extension_is_unchanged() {
        let path = resolve_path(Some("backups/forum.sql"), None, Path::new("storage"), fixed_now());
        assert_eq!(path, PathBuf::from("backups/forum.sql"));
    }

    #[test]
    fn test_omitted_path_defaults_to_timestamped_file() {
        let path = resolve_path(None, None, Path::new("storage"), fixed_now());
        assert_eq!(
            path,
            PathBuf::from("storage/dumps/dump-2024-03-01-134509.sql")
        );
    }

    #[test]
    fn test_empty_path_behaves_like_omitted() {
        let path = resolve_path(Some(""), None, Path::new("storage"), fixed_now());
        assert_eq!(
            path,
            PathBuf::from("storage/dumps/dump-2024-03-01-134509.sql")
        );
    }

    #[test]
    fn test_path_without_extension_gets_sql() {
        let path = resolve_path(Some("backup"), None, Path::new("storage"), fixed_now());
        assert_eq!(path, PathBuf::from("backup.sql"));
    }

    #[test]
    fn test_compression_appends_second_extension() {
        // dump.sql.gz is intentional, not an extension replacement
        let path = resolve_path(
            Some("backup.sql"),
            Some(Compression::Gzip),
            Path::new("storage"),
            fixed_now(),
        );
        assert_eq!(path, PathBuf::from("backup.sql.gz"));
    }

    #[test]
    fn test_matching_compression_extension_is_not_doubled() {
        let path = resolve_path(
            Some("backup.gz"),
            Some(Compression::Gzip),
            Path::new("storage"),
            fixed_now(),
        );
        assert_eq!(path, PathBuf::from("backup.gz"));
    }

    #[test]
    fn test_compression_on_extensionless_path() {
        let path = resolve_path(
            Some("backup"),
            Some(Compression::Bzip2),
            Path::new("storage"),
            fixed_now(),
        );
        assert_eq!(path, PathBuf::from("backup.bz2"));
    }

    #[test]
    fn test_resolved_path_always_has_extension() {
        for (supplied, compression) in [
            (None, None),
            (Some("backup"), None),
            (Some("backup"), Some(Compression::Gzip)),
            (Some("backup.xyz"), Some(Compression::Bzip2)),
        ] {
            let path = resolve_path(supplied, compression, Path::new("storage"), fixed_now());
            assert!(
                path.extension().is_some_and(|e| !e.is_empty()),
                "no extension on {}",
                path.display()
            );
        }
    }

    #[test]
    fn test_compressor_selected_from_resolved_extension() {
        let path = resolve_path(
            Some("backup.sql"),
            Some(Compression::Gzip),
            Path::new("storage"),
            fixed_now(),
        );
        let compressor = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Compression::from_extension);
        assert_eq!(compressor, Some(Compression::Gzip));
    }

    #[test]
    fn test_plain_sql_path_selects_no_compressor() {
        let compressor = final_extension("backup.sql").and_then(|e| Compression::from_extension(&e));
        assert_eq!(compressor, None);
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dumps/nested/dump.sql");

        ensure_directory(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());

        // Second call is a no-op
        ensure_directory(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_directory_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dumps/dump.sql");
        ensure_directory(&path).unwrap();

        let mode = std::fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_split_table_list() {
        assert_eq!(
            split_table_list("users,posts,tags"),
            vec!["users", "posts", "tags"]
        );
        assert_eq!(split_table_list("users"), vec!["users"]);
    }
}
