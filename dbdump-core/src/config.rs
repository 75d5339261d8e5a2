//! Application configuration.
//!
//! Connection parameters and the storage root come from a JSON config file
//! supplied by the environment the tool runs in; the dump command itself
//! never owns credential sourcing.

use crate::error::{DumpError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database connection parameters for the dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host address
    pub host: String,
    /// Database name to dump
    pub database: String,
    /// Optional port number (3306 when unset)
    #[serde(default)]
    pub port: Option<u16>,
    /// Username for the connection
    pub username: String,
    /// Password for the connection
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never include credentials
        write!(
            f,
            "{}:{}/{}",
            self.host,
            self.port.unwrap_or(3306),
            self.database
        )
    }
}

/// Top-level configuration for the dbdump binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Connection parameters
    pub database: DatabaseConfig,
    /// Root directory for default dump paths
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("storage")
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    /// Returns a configuration error if the file cannot be read or parsed,
    /// or if the parsed values fail validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DumpError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| DumpError::Serialization {
            context: format!("Failed to parse config file {}", path.display()),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    ///
    /// # Errors
    /// Returns an error if required connection parameters are missing.
    pub fn validate(&self) -> Result<()> {
        if self.database.host.is_empty() {
            return Err(DumpError::configuration("database host cannot be empty"));
        }

        if self.database.database.is_empty() {
            return Err(DumpError::configuration("database name cannot be empty"));
        }

        if let Some(0) = self.database.port {
            return Err(DumpError::configuration("port must be greater than 0"));
        }

        Ok(())
    }
}
