//! Inkframe core library — display configuration types, environment
//! settings, errors.
//!
//! Public API surface:
//! - [`types`] — wire types for the remotely-fetched display configuration
//! - [`settings`] — environment-provided device settings
//! - [`error`] — [`SettingsError`], [`TimeParseError`]

pub mod error;
pub mod settings;
pub mod types;

pub use error::{SettingsError, TimeParseError};
pub use settings::Settings;
pub use types::{Condition, DisplayConfig, ScreenSpec, TimeOfDay};
