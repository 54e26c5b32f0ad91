//! Configuration types for eventhub.
//!
//! This crate does not depend on the hub itself, so publication modes are
//! kept as strings here and parsed at the boundary. Every struct implements
//! [`Default`] with the same values as the embedded `defaults.toml`, so a bare
//! `[section]` header in TOML produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hub-wide dispatch defaults.
    pub hub: HubSection,
    /// Built-in background worker.
    pub background: BackgroundSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// HubSection
// ---------------------------------------------------------------------------

/// Hub-wide dispatch defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Publication mode for subscriptions that do not choose one:
    /// `"calling_thread"`, `"main_thread"` or `"background_thread"`.
    pub default_mode: String,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            default_mode: "calling_thread".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// BackgroundSection
// ---------------------------------------------------------------------------

/// Built-in background worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSection {
    /// OS thread name of the worker.
    pub thread_name: String,
}

impl Default for BackgroundSection {
    fn default() -> Self {
        Self {
            thread_name: "eventhub-background".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["eventhub=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
