//! Parser settings, loadable from JSON.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse JSON settings: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// What the matcher does when an option lacks its value tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Stop scanning; tokens after the option are dropped from the
    /// compacted output.
    #[default]
    Halt,
    /// Keep the option token in the output and carry on scanning.
    Continue,
}

fn default_help_option() -> bool {
    true
}

/// Settings for a registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Behaviour on a missing option value (default: halt)
    #[serde(default)]
    pub missing_value: MissingValuePolicy,
    /// Intercept `--help` and report the usage text (default: true)
    #[serde(default = "default_help_option")]
    pub help_option: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            missing_value: MissingValuePolicy::default(),
            help_option: default_help_option(),
        }
    }
}

impl Settings {
    /// Parse a JSON string into Settings.
    pub fn from_json(json: &str) -> Result<Settings, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings)
    }
}
