//! Configuration errors.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file (or the merged tree) is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// File path, or a `<...>` marker for in-memory sources.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A value is outside its accepted set or range.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted field path (e.g. `logging.level`).
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// An `EVENTHUB_*` environment variable could not be used.
    #[error("invalid environment variable {var}: {message}")]
    EnvError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
