//! Error types for the alertbot-routing crate.

use thiserror::Error;

/// Errors raised while loading or validating the routing configuration.
///
/// All variants are fatal at startup: the process must never serve with a
/// partially valid routing document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read routing config {path}: {source}")]
    Io {
        /// Path to the file that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the schema.
    #[error("invalid routing config syntax: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but failed semantic validation.
    ///
    /// Each entry is one `path: message` line.
    #[error("invalid routing config:\n{}", errors.join("\n"))]
    Invalid {
        /// All validation failures, one per line.
        errors: Vec<String>,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
