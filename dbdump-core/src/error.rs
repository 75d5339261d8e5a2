//! Error types for dump operations.
//!
//! Two failure classes matter at runtime: configuration problems, which
//! propagate to the caller untouched, and invocation failures from the
//! external dump process, which the command layer catches and reports.

use thiserror::Error;

/// Main error type for dbdump operations.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The external dump process could not be started or exited non-zero
    #[error("{context}")]
    Invocation { context: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `DumpError`
pub type Result<T> = std::result::Result<T, DumpError>;

impl DumpError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invocation error with the underlying failure text
    pub fn invocation(context: impl Into<String>) -> Self {
        Self::Invocation {
            context: context.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for failures raised while invoking the external dump process.
    ///
    /// The command layer converts these into a reported error and exit
    /// code 1; everything else propagates as caller misconfiguration.
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Invocation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = DumpError::configuration("database name cannot be empty");
        assert!(error.to_string().contains("database name cannot be empty"));

        let error = DumpError::invocation("mysqldump exited with status 2");
        assert!(error.to_string().contains("exited with status 2"));
        assert!(error.is_invocation());
    }

    #[test]
    fn test_configuration_is_not_invocation() {
        let error = DumpError::configuration("bad port");
        assert!(!error.is_invocation());
    }
}
