#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for eventhub.
//!
//! This crate provides a single [`Config`] type holding the hub's dispatch
//! defaults, the background worker settings, and logging settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use eventhub_config::Config;
//!
//! let config = Config::load(Some(std::path::Path::new("eventhub.toml"))).unwrap();
//! println!("Default mode: {}", config.hub.default_mode);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file** (the path passed to [`Config::load`]; skipped if missing)
//! 2. **Environment variables** (`EVENTHUB_*`) - fallback only
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal eventhub crates**.
//! Conversion to hub and logging types happens in the `config` feature of
//! `eventhub` and `eventhub-telemetry`.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from defaults, an optional file, and `EVENTHUB_*`
    /// environment variables.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed, an environment
    /// variable is unusable, or the final configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load a single config file, without defaults file or environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse and validate a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is malformed or fails validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::from_toml_str(content)
    }
}
