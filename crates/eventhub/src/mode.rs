//! Publication modes: where a handler runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HubError;

/// Name of a custom scheduler registered on an [`EventHubBuilder`](crate::EventHubBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulerTag(String);

impl SchedulerTag {
    /// Create a tag. Empty names are rejected when the scheduler is registered.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchedulerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchedulerTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Execution context a subscription's handler is dispatched to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationMode {
    /// Run synchronously inside `publish`.
    #[default]
    CallingThread,
    /// Run on the affinity thread: inline when already on it, queued otherwise.
    MainThread,
    /// Run on the hub's single serial background worker.
    BackgroundThread,
    /// Hand off to a scheduler registered under this tag.
    Custom(SchedulerTag),
}

impl PublicationMode {
    /// Custom mode for the given tag.
    pub fn custom(tag: impl Into<SchedulerTag>) -> Self {
        Self::Custom(tag.into())
    }
}

impl fmt::Display for PublicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallingThread => f.write_str("calling_thread"),
            Self::MainThread => f.write_str("main_thread"),
            Self::BackgroundThread => f.write_str("background_thread"),
            Self::Custom(tag) => write!(f, "custom:{tag}"),
        }
    }
}

impl FromStr for PublicationMode {
    type Err = HubError;

    /// Parses the [`Display`](fmt::Display) form, e.g. `main_thread` or `custom:io`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "calling_thread" => Ok(Self::CallingThread),
            "main_thread" => Ok(Self::MainThread),
            "background_thread" => Ok(Self::BackgroundThread),
            other => match other.strip_prefix("custom:") {
                Some(tag) if !tag.is_empty() => Ok(Self::custom(tag)),
                _ => Err(HubError::invalid(
                    "mode",
                    format!(
                        "unknown publication mode '{other}'; expected calling_thread, \
                         main_thread, background_thread or custom:<tag>"
                    ),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builtin_modes() {
        assert_eq!(
            "calling_thread".parse::<PublicationMode>().unwrap(),
            PublicationMode::CallingThread
        );
        assert_eq!(
            " main_thread ".parse::<PublicationMode>().unwrap(),
            PublicationMode::MainThread
        );
        assert_eq!(
            "background_thread".parse::<PublicationMode>().unwrap(),
            PublicationMode::BackgroundThread
        );
    }

    #[test]
    fn test_parse_custom_mode() {
        let mode: PublicationMode = "custom:io".parse().unwrap();
        assert_eq!(mode, PublicationMode::custom("io"));
        assert_eq!(mode.to_string(), "custom:io");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "ui".parse::<PublicationMode>().unwrap_err();
        assert_eq!(err.as_label(), "hub_invalid_argument");
        assert!("custom:".parse::<PublicationMode>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PublicationMode::BackgroundThread).unwrap();
        assert_eq!(json, "\"background_thread\"");

        let custom: PublicationMode = serde_json::from_str(r#"{"custom":"io"}"#).unwrap();
        assert_eq!(custom, PublicationMode::custom("io"));
    }

    #[test]
    fn test_default_is_calling_thread() {
        assert_eq!(PublicationMode::default(), PublicationMode::CallingThread);
    }
}
