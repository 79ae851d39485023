//! Wire types for the remotely-fetched display configuration.
//!
//! Field names mirror the JSON document served by the config endpoint.
//! A `DisplayConfig` is adopted wholesale on each successful fetch and is
//! never partially mutated afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;

/// Rotation slot length applied when a screen does not set one.
pub const DEFAULT_SCREEN_DURATION_MINUTES: u64 = 20;

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

/// A wall-clock time of day, stored as minutes since midnight.
///
/// Serialized as `"HH:MM"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// 00:00.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Build from an hour/minute pair. Returns `None` when out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(u16::from(hour) * 60 + u16::from(minute)))
        } else {
            None
        }
    }

    /// Minutes since midnight, `0..1440`.
    pub fn minute_of_day(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError {
            value: s.to_owned(),
        };
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Whether `now` falls inside the `[start, end)` display window.
///
/// A window whose start is not strictly before its end crosses midnight and
/// is active on both sides of it.
pub fn window_contains(start: TimeOfDay, end: TimeOfDay, now: TimeOfDay) -> bool {
    if start < end {
        start <= now && now < end
    } else {
        now >= start || now < end
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// An eligibility condition attached to a screen.
///
/// Closed sum type, tagged by `type` on the wire. `expected_state` inverts
/// a condition when set to `false` and defaults to `true` when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Condition {
    /// Holds iff the presence state of `entity` equals `zone`, compared
    /// against `expected_state`. Lookup failures make the condition false
    /// regardless of `expected_state`.
    UserZone {
        entity: String,
        zone: String,
        #[serde(default = "default_true")]
        expected_state: bool,
    },

    /// Holds iff today's weekday index (0 = Sunday … 6 = Saturday) is in
    /// `days`, compared against `expected_state`.
    DayOfWeek {
        days: BTreeSet<u8>,
        #[serde(default = "default_true")]
        expected_state: bool,
    },

    /// Declared in configuration but with no resolved evaluation
    /// semantics; always evaluates false.
    CalendarEvent {
        calendar: String,
        search: String,
        #[serde(default)]
        offset_minutes: i64,
        #[serde(default = "default_true")]
        expected_state: bool,
    },
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

/// One configured content source with its display policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSpec {
    pub url: String,

    /// Rotation slot length in minutes; only consulted when no time window
    /// is set. `None` means [`DEFAULT_SCREEN_DURATION_MINUTES`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TimeOfDay>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TimeOfDay>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// When set and the screen is eligible, it preempts every other
    /// selection branch.
    #[serde(default)]
    pub force_show_if_conditions_match: bool,
}

impl ScreenSpec {
    /// The scheduled-mode window, present only when both endpoints are set.
    pub fn window(&self) -> Option<(TimeOfDay, TimeOfDay)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Whether this screen is in scheduled mode rather than rotation mode.
    pub fn has_window(&self) -> bool {
        self.window().is_some()
    }

    /// Rotation slot length in milliseconds, with the default applied.
    pub fn duration_ms(&self) -> i64 {
        let minutes = self
            .duration_minutes
            .unwrap_or(DEFAULT_SCREEN_DURATION_MINUTES);
        (minutes * 60_000) as i64
    }
}

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

/// The full display configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Ordered: rotation order and schedule priority order.
    #[serde(default)]
    pub screens: Vec<ScreenSpec>,

    /// Duration-based rotation picks a pseudo-random next index instead of
    /// advancing sequentially.
    #[serde(default)]
    pub randomize_screens: bool,

    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,

    #[serde(default = "default_conditions_check_interval_minutes")]
    pub conditions_check_interval_minutes: u64,
}

impl DisplayConfig {
    /// Cadence for re-fetching this document.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }

    /// Cadence for re-running screen selection.
    pub fn conditions_check_interval(&self) -> Duration {
        Duration::from_secs(self.conditions_check_interval_minutes * 60)
    }
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval_minutes() -> u64 {
    30
}

fn default_conditions_check_interval_minutes() -> u64 {
    5
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
