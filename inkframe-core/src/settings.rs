//! Environment-provided device settings.
//!
//! Everything the orchestrator needs beyond the remote configuration:
//! endpoint URLs, the fallback URL, presence-API access, and the canonical
//! output image path. Read through an injectable lookup so tests never
//! touch the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SettingsError;

pub const ENV_CONFIG_URL: &str = "INKFRAME_CONFIG_URL";
pub const ENV_HEALTH_URL: &str = "INKFRAME_HEALTH_URL";
pub const ENV_FALLBACK_URL: &str = "INKFRAME_FALLBACK_URL";
pub const ENV_PRESENCE_URL: &str = "INKFRAME_PRESENCE_URL";
pub const ENV_PRESENCE_TOKEN: &str = "INKFRAME_PRESENCE_TOKEN";
pub const ENV_OUTPUT_PATH: &str = "INKFRAME_OUTPUT_PATH";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "INKFRAME_HTTP_TIMEOUT_SECS";

const DEFAULT_FALLBACK_URL: &str = "https://www.google.com";
const DEFAULT_PRESENCE_URL: &str = "http://homeassistant.local:8123";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const OUTPUT_FILE_NAME: &str = "current_view.png";

/// Resolved device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Config endpoint; `None` disables remote sync (fallback URL only).
    pub config_url: Option<String>,
    /// Health endpoint; `None` disables liveness pings.
    pub health_url: Option<String>,
    /// Shown when no configuration has ever been fetched.
    pub fallback_url: String,
    /// Base URL of the presence-state API used by user-zone conditions.
    pub presence_url: String,
    /// Bearer token for the presence API; `None` makes every user-zone
    /// condition ineligible.
    pub presence_token: Option<String>,
    /// Canonical capture path, atomically overwritten on accepted frames.
    pub output_path: PathBuf,
    /// Hard timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, applying defaults for everything
    /// absent. Empty values count as absent.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let output_path = match get(ENV_OUTPUT_PATH) {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .ok_or(SettingsError::HomeNotFound)?
                .join(".inkframe")
                .join(OUTPUT_FILE_NAME),
        };

        let http_timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| SettingsError::Invalid {
                    name: ENV_HTTP_TIMEOUT_SECS,
                    value: raw.clone(),
                    reason: "expected a whole number of seconds".into(),
                })?;
                if secs == 0 {
                    return Err(SettingsError::Invalid {
                        name: ENV_HTTP_TIMEOUT_SECS,
                        value: raw,
                        reason: "timeout must be at least one second".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            config_url: get(ENV_CONFIG_URL),
            health_url: get(ENV_HEALTH_URL),
            fallback_url: get(ENV_FALLBACK_URL)
                .unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_owned()),
            presence_url: get(ENV_PRESENCE_URL)
                .unwrap_or_else(|| DEFAULT_PRESENCE_URL.to_owned()),
            presence_token: get(ENV_PRESENCE_TOKEN),
            output_path,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let settings = settings_from(&[("INKFRAME_OUTPUT_PATH", "/tmp/view.png")])
            .expect("settings");
        assert!(settings.config_url.is_none());
        assert!(settings.health_url.is_none());
        assert_eq!(settings.fallback_url, "https://www.google.com");
        assert_eq!(settings.presence_url, "http://homeassistant.local:8123");
        assert!(settings.presence_token.is_none());
        assert_eq!(settings.http_timeout, Duration::from_secs(15));
    }

    #[test]
    fn empty_values_count_as_absent() {
        let settings = settings_from(&[
            ("INKFRAME_CONFIG_URL", "  "),
            ("INKFRAME_OUTPUT_PATH", "/tmp/view.png"),
        ])
        .expect("settings");
        assert!(settings.config_url.is_none());
    }

    #[test]
    fn explicit_values_win() {
        let settings = settings_from(&[
            ("INKFRAME_CONFIG_URL", "http://api.test/device.json"),
            ("INKFRAME_HEALTH_URL", "http://api.test/health?device=a"),
            ("INKFRAME_FALLBACK_URL", "http://dash.test/"),
            ("INKFRAME_PRESENCE_TOKEN", "secret"),
            ("INKFRAME_OUTPUT_PATH", "/var/lib/inkframe/view.png"),
            ("INKFRAME_HTTP_TIMEOUT_SECS", "5"),
        ])
        .expect("settings");
        assert_eq!(
            settings.config_url.as_deref(),
            Some("http://api.test/device.json")
        );
        assert_eq!(settings.fallback_url, "http://dash.test/");
        assert_eq!(settings.presence_token.as_deref(), Some("secret"));
        assert_eq!(
            settings.output_path,
            PathBuf::from("/var/lib/inkframe/view.png")
        );
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = settings_from(&[
            ("INKFRAME_HTTP_TIMEOUT_SECS", "soon"),
            ("INKFRAME_OUTPUT_PATH", "/tmp/view.png"),
        ])
        .expect_err("non-numeric timeout");
        assert!(matches!(err, SettingsError::Invalid { .. }));

        let err = settings_from(&[
            ("INKFRAME_HTTP_TIMEOUT_SECS", "0"),
            ("INKFRAME_OUTPUT_PATH", "/tmp/view.png"),
        ])
        .expect_err("zero timeout");
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }
}
