//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! their accepted sets.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Publication modes that can be chosen from configuration. Custom modes
/// need a scheduler instance and are only available in code.
pub const VALID_DEFAULT_MODES: &[&str] = &["calling_thread", "main_thread", "background_thread"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_hub(config)?;
    validate_background(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_hub(config: &Config) -> ConfigResult<()> {
    if !VALID_DEFAULT_MODES.contains(&config.hub.default_mode.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "hub.default_mode".to_owned(),
            message: format!(
                "unsupported publication mode '{}'; expected one of: {}",
                config.hub.default_mode,
                VALID_DEFAULT_MODES.join(", ")
            ),
        });
    }
    Ok(())
}

fn validate_background(config: &Config) -> ConfigResult<()> {
    let name = &config.background.thread_name;
    if name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "background.thread_name".to_owned(),
            message: "thread name must not be empty".to_owned(),
        });
    }
    // Thread names are handed to the OS as C strings.
    if name.contains('\0') {
        return Err(ConfigError::ValidationError {
            field: "background.thread_name".to_owned(),
            message: "thread name must not contain NUL bytes".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
