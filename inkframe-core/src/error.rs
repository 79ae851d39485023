//! Error types for inkframe-core.

use thiserror::Error;

/// A `"HH:MM"` string that could not be parsed into a [`crate::TimeOfDay`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid time of day '{value}'; expected HH:MM with hour < 24 and minute < 60")]
pub struct TimeParseError {
    pub value: String,
}

/// All errors that can arise while reading device settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An environment variable was present but held an unusable value.
    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// `dirs::home_dir()` returned `None` — cannot derive the default
    /// output path.
    #[error("cannot determine home directory; set $HOME or INKFRAME_OUTPUT_PATH")]
    HomeNotFound,
}
