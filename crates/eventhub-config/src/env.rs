//! `EVENTHUB_*` environment variable fallbacks.
//!
//! Environment variables sit below the config file: they only fill fields
//! the file left unset, and override the embedded defaults.

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every variable this crate reads.
pub const ENV_PREFIX: &str = "EVENTHUB_";

/// Variable name, section, and key it falls back for.
pub const ENV_FALLBACKS: &[(&str, &str, &str)] = &[
    ("EVENTHUB_DEFAULT_MODE", "hub", "default_mode"),
    ("EVENTHUB_BACKGROUND_THREAD_NAME", "background", "thread_name"),
    ("EVENTHUB_LOG_LEVEL", "logging", "level"),
    ("EVENTHUB_LOG_FORMAT", "logging", "format"),
];

/// Snapshot every `EVENTHUB_*` variable of the current process.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if one of them is not valid UTF-8.
pub fn collect_env_vars() -> ConfigResult<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (key, value) in std::env::vars_os() {
        let Some(key) = key.to_str() else {
            continue;
        };
        if !key.starts_with(ENV_PREFIX) {
            continue;
        }
        let value = value.into_string().map_err(|_| ConfigError::EnvError {
            var: key.to_owned(),
            message: "value is not valid UTF-8".to_owned(),
        })?;
        vars.insert(key.to_owned(), value);
    }
    Ok(vars)
}

/// Copy known variables into `merged` for every field `file_layer` did not set.
/// Returns how many were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] for a known variable set to an empty
/// string.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    file_layer: Option<&toml::Value>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied: usize = 0;

    for &(var, section, key) in ENV_FALLBACKS {
        let Some(value) = env_vars.get(var) else {
            continue;
        };
        if file_layer.is_some_and(|file| is_set(file, section, key)) {
            tracing::debug!(var, "config file sets this field, ignoring env var");
            continue;
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::EnvError {
                var: var.to_owned(),
                message: "must not be empty".to_owned(),
            });
        }

        let Some(root) = merged.as_table_mut() else {
            continue;
        };
        let table = root
            .entry(section)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = table.as_table_mut() {
            table.insert(key.to_owned(), toml::Value::String(value.to_owned()));
            applied = applied.saturating_add(1);
        }
    }

    Ok(applied)
}

fn is_set(value: &toml::Value, section: &str, key: &str) -> bool {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn defaults() -> toml::Value {
        toml::from_str(include_str!("defaults.toml")).unwrap()
    }

    #[test]
    fn test_fallback_overrides_defaults() {
        let mut merged = defaults();
        let applied = apply_env_fallbacks(
            &mut merged,
            None,
            &env(&[("EVENTHUB_LOG_LEVEL", "debug")]),
        )
        .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
    }

    #[test]
    fn test_file_wins_over_env() {
        let file: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let mut merged = defaults();
        merged["logging"]["level"] = toml::Value::String("warn".to_owned());

        let applied = apply_env_fallbacks(
            &mut merged,
            Some(&file),
            &env(&[
                ("EVENTHUB_LOG_LEVEL", "trace"),
                ("EVENTHUB_LOG_FORMAT", "json"),
            ]),
        )
        .unwrap();

        assert_eq!(applied, 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
        assert_eq!(merged["logging"]["format"].as_str(), Some("json"));
    }

    #[test]
    fn test_empty_value_rejected() {
        let mut merged = defaults();
        let err = apply_env_fallbacks(
            &mut merged,
            None,
            &env(&[("EVENTHUB_DEFAULT_MODE", "  ")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var, .. } if var == "EVENTHUB_DEFAULT_MODE"));
    }

    #[test]
    fn test_unknown_variables_ignored() {
        let mut merged = defaults();
        let applied =
            apply_env_fallbacks(&mut merged, None, &env(&[("EVENTHUB_UNUSED", "x")])).unwrap();
        assert_eq!(applied, 0);
        assert_eq!(merged, defaults());
    }
}
