//! Telemetry errors.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configuration could not be turned into a subscriber.
    #[error("invalid logging configuration: {0}")]
    ConfigError(String),

    /// A global subscriber is already installed, or the writer failed to open.
    #[error("failed to initialize logging: {0}")]
    InitError(String),
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
