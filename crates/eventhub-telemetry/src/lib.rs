//! Eventhub Telemetry - Logging setup for applications built on eventhub.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats
//! - Stdout, stderr and rolling file targets
//! - With the `config` feature, conversion from the `[logging]` config section
//!
//! Deliveries often run on a worker or affinity thread rather than the
//! publisher's, so thread names are included in log lines by default.
//!
//! # Example
//!
//! ```rust,no_run
//! use eventhub_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), eventhub_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("eventhub=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
