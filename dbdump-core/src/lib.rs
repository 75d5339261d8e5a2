//! Core building blocks for the dbdump CLI.
//!
//! This crate provides the mysqldump invocation builder, the compression
//! registry, configuration loading, byte-size formatting, and the shared
//! error and logging plumbing used by the binary.

pub mod compress;
pub mod config;
pub mod dumper;
pub mod error;
pub mod format;
pub mod logging;

// Re-export commonly used types
pub use compress::{Compression, DumpWriter};
pub use config::{AppConfig, DatabaseConfig};
pub use dumper::{MysqlDumper, ALLOWED_MYSQLDUMP_OPTIONS};
pub use error::{DumpError, Result};
pub use format::human_readable_size;
pub use logging::init_logging;
