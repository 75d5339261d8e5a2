//! mysqldump invocation builder.
//!
//! [`MysqlDumper`] translates connection parameters and CLI choices into the
//! argv of an external `mysqldump` process, then streams the process output
//! into a (possibly compressed) dump file. The builder never shells out
//! until [`MysqlDumper::dump_to_file`] is called, so argv construction is
//! testable without a database.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::compress::{Compression, DumpWriter};
use crate::error::{DumpError, Result};

/// mysqldump options that may be forwarded verbatim from the command line.
///
/// Option names mirror the mysqldump flag vocabulary; anything outside this
/// set is rejected at the argument-parsing boundary. Appended pass-through
/// options follow this declaration order, not input order.
pub const ALLOWED_MYSQLDUMP_OPTIONS: [&str; 70] = [
    "add-drop-table",
    "add-locks",
    "allow-keywords",
    "apply-slave-statements",
    "bind-address",
    "character-sets-dir",
    "comments",
    "compatible",
    "compact",
    "complete-insert",
    "create-options",
    "databases",
    "debug",
    "debug-check",
    "debug-info",
    "default-character-set",
    "delete-master-logs",
    "disable-keys",
    "dump-slave",
    "events",
    "extended-insert",
    "fields-terminated-by",
    "fields-enclosed-by",
    "fields-optionally-enclosed-by",
    "fields-escaped-by",
    "flush-logs",
    "flush-privileges",
    "force",
    "hex-blob",
    "host",
    "insert-ignore",
    "lines-terminated-by",
    "lock-all-tables",
    "lock-tables",
    "log-error",
    "master-data",
    "max-allowed-packet",
    "net-buffer-length",
    "no-autocommit",
    "no-create-db",
    "no-create-info",
    "no-set-names",
    "no-tablespaces",
    "opt",
    "order-by-primary",
    "port",
    "protocol",
    "quick",
    "quote-names",
    "replace",
    "routines",
    "set-charset",
    "single-transaction",
    "dump-date",
    "skip-comments",
    "skip-opt",
    "socket",
    "ssl",
    "ssl-ca",
    "ssl-capath",
    "ssl-cert",
    "ssl-cipher",
    "ssl-key",
    "ssl-verify-server-cert",
    "tab",
    "triggers",
    "tz-utc",
    "user",
    "where",
    "xml",
];

/// Builder for a single mysqldump invocation.
#[derive(Clone)]
pub struct MysqlDumper {
    host: String,
    db_name: String,
    port: u16,
    username: String,
    password: String,
    dump_binary_path: Option<PathBuf>,
    include_tables: Vec<String>,
    exclude_tables: Vec<String>,
    create_tables: bool,
    include_data: bool,
    skip_auto_increment: bool,
    column_statistics: bool,
    extra_options: Vec<String>,
}

impl std::fmt::Debug for MysqlDumper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never render the plaintext password
        f.debug_struct("MysqlDumper")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("dump_binary_path", &self.dump_binary_path)
            .field("include_tables", &self.include_tables)
            .field("exclude_tables", &self.exclude_tables)
            .field("create_tables", &self.create_tables)
            .field("include_data", &self.include_data)
            .field("skip_auto_increment", &self.skip_auto_increment)
            .field("column_statistics", &self.column_statistics)
            .field("extra_options", &self.extra_options)
            .finish()
    }
}

impl Default for MysqlDumper {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            db_name: String::new(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            dump_binary_path: None,
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            create_tables: true,
            include_data: true,
            skip_auto_increment: false,
            column_statistics: true,
            extra_options: Vec::new(),
        }
    }
}

impl MysqlDumper {
    /// Creates a dumper with defaults (localhost:3306, no database selected).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the database name to dump.
    #[must_use]
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the password. Passed to the child process via `MYSQL_PWD`,
    /// never on the command line.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Overrides the mysqldump executable location.
    #[must_use]
    pub fn with_dump_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_binary_path = Some(path.into());
        self
    }

    /// Restricts the dump to the given tables.
    ///
    /// # Errors
    /// Returns a configuration error if tables were already excluded.
    pub fn include_tables(mut self, tables: Vec<String>) -> Result<Self> {
        if !self.exclude_tables.is_empty() {
            return Err(DumpError::configuration(
                "Cannot include tables when tables are already excluded",
            ));
        }
        self.include_tables = tables;
        Ok(self)
    }

    /// Excludes the given tables from the dump.
    ///
    /// # Errors
    /// Returns a configuration error if an include list was already set.
    pub fn exclude_tables(mut self, tables: Vec<String>) -> Result<Self> {
        if !self.include_tables.is_empty() {
            return Err(DumpError::configuration(
                "Cannot exclude tables when tables are already included",
            ));
        }
        self.exclude_tables = tables;
        Ok(self)
    }

    /// Omits CREATE TABLE statements (`--no-create-info`).
    #[must_use]
    pub fn skip_table_structure(mut self) -> Self {
        self.create_tables = false;
        self
    }

    /// Omits row data (`--no-data`).
    #[must_use]
    pub fn skip_data(mut self) -> Self {
        self.include_data = false;
        self
    }

    /// Strips AUTO_INCREMENT counter values from the output stream.
    ///
    /// mysqldump has no native flag for this, so the table options of
    /// CREATE TABLE statements are rewritten while streaming.
    #[must_use]
    pub fn skip_auto_increment(mut self) -> Self {
        self.skip_auto_increment = true;
        self
    }

    /// Disables column statistics (`--column-statistics=0`), needed when a
    /// MySQL 8 mysqldump talks to an older server.
    #[must_use]
    pub fn skip_column_statistics(mut self) -> Self {
        self.column_statistics = false;
        self
    }

    /// Appends a pre-validated pass-through option (`--name` or
    /// `--name=value`).
    #[must_use]
    pub fn add_extra_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    /// The argv handed to the mysqldump binary, excluding the binary itself.
    #[must_use]
    pub fn dump_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--host={}", self.host),
            format!("--port={}", self.port),
            format!("--user={}", self.username),
        ];

        if !self.column_statistics {
            args.push("--column-statistics=0".to_string());
        }

        if !self.create_tables {
            args.push("--no-create-info".to_string());
        }

        if !self.include_data {
            args.push("--no-data".to_string());
        }

        for table in &self.exclude_tables {
            args.push(format!("--ignore-table={}.{table}", self.db_name));
        }

        args.extend(self.extra_options.iter().cloned());

        args.push(self.db_name.clone());
        args.extend(self.include_tables.iter().cloned());

        args
    }

    fn validate(&self) -> Result<()> {
        if self.db_name.is_empty() {
            return Err(DumpError::configuration("database name cannot be empty"));
        }
        Ok(())
    }

    /// Runs mysqldump and streams its output to `path`.
    ///
    /// Blocks until the child process completes. A zero-byte or truncated
    /// file may remain on disk after a failed attempt; no cleanup is
    /// performed.
    ///
    /// # Errors
    /// Returns an invocation error if the process cannot be started or
    /// exits non-zero, and an I/O error if writing the dump file fails.
    pub fn dump_to_file(&self, path: &Path, compression: Option<Compression>) -> Result<()> {
        self.validate()?;

        let binary: OsString = self
            .dump_binary_path
            .as_ref()
            .map_or_else(|| OsString::from("mysqldump"), |p| p.clone().into_os_string());
        let args = self.dump_args();

        debug!("Running {:?} with args {:?}", binary, args);

        let mut child = Command::new(&binary)
            .args(&args)
            .env("MYSQL_PWD", &self.password)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DumpError::invocation(format!("Failed to start {}: {e}", binary.to_string_lossy()))
            })?;

        // Both pipes were requested above
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DumpError::invocation("Failed to capture mysqldump stdout"))?;

        // Drained concurrently: a child flooding stderr with warnings would
        // otherwise block on a full pipe while we block reading stdout
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut text);
            }
            text
        });

        let file = std::fs::File::create(path)
            .map_err(|e| DumpError::io(format!("Failed to create {}", path.display()), e))?;
        let mut writer = DumpWriter::new(file, compression);

        let copy_result = if self.skip_auto_increment {
            copy_without_auto_increment(stdout, &mut writer)
        } else {
            std::io::copy(&mut BufReader::new(stdout), &mut writer).map(drop)
        };
        copy_result
            .map_err(|e| DumpError::io(format!("Failed to write {}", path.display()), e))?;

        writer
            .finish()
            .map_err(|e| DumpError::io(format!("Failed to finalize {}", path.display()), e))?;

        // mysqldump warnings land here too; only surfaced on failure
        let stderr_text = stderr_reader.join().unwrap_or_default();

        let status = child
            .wait()
            .map_err(|e| DumpError::invocation(format!("Failed to wait for mysqldump: {e}")))?;

        if !status.success() {
            let detail = stderr_text.trim();
            let context = if detail.is_empty() {
                format!("mysqldump exited with {status}")
            } else {
                format!("mysqldump exited with {status}: {detail}")
            };
            return Err(DumpError::invocation(context));
        }

        Ok(())
    }
}

/// Copies the dump stream while stripping ` AUTO_INCREMENT=<n>` table
/// options. Operates on raw bytes so INSERT rows containing arbitrary blob
/// data pass through untouched.
fn copy_without_auto_increment<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
) -> std::io::Result<()> {
    const MARKER: &[u8] = b" AUTO_INCREMENT=";

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }

        if let Some(start) = find_subsequence(&line, MARKER) {
            let digits_start = start + MARKER.len();
            let digits_end = line[digits_start..]
                .iter()
                .position(|b| !b.is_ascii_digit())
                .map_or(line.len(), |offset| digits_start + offset);

            if digits_end > digits_start {
                writer.write_all(&line[..start])?;
                writer.write_all(&line[digits_end..])?;
                continue;
            }
        }

        writer.write_all(&line)?;
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
