//! Condition evaluation.
//!
//! A screen is eligible iff every condition in its list holds; evaluation
//! short-circuits on the first failure. Anything that prevents a lookup —
//! missing credential, transport failure, unresolved condition kind —
//! makes that condition false. Eligibility never errors and never panics.

use chrono::Weekday;
use thiserror::Error;

use inkframe_core::types::{Condition, DisplayConfig, ScreenSpec};

/// Errors a presence lookup can surface. All of them resolve the owning
/// condition to false.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No access credential is configured for the presence API.
    #[error("presence credential not configured")]
    MissingCredential,

    /// The lookup call itself failed (transport, HTTP status, decode).
    #[error("presence lookup failed: {0}")]
    Lookup(String),
}

/// External presence-state source for `user-zone` conditions.
pub trait PresenceLookup {
    /// Current state of `entity`, e.g. `"home"` or `"not_home"`.
    fn state_of(&self, entity: &str) -> Result<String, LookupError>;
}

/// A presence source with no credential; every lookup fails.
pub struct NoPresence;

impl PresenceLookup for NoPresence {
    fn state_of(&self, _entity: &str) -> Result<String, LookupError> {
        Err(LookupError::MissingCredential)
    }
}

/// Whether every condition on `screen` holds right now.
pub fn screen_eligible(
    screen: &ScreenSpec,
    presence: &dyn PresenceLookup,
    today: Weekday,
) -> bool {
    screen
        .conditions
        .iter()
        .all(|condition| condition_holds(condition, presence, today))
}

/// Indices of eligible screens, in config order.
pub fn eligible_screens(
    config: &DisplayConfig,
    presence: &dyn PresenceLookup,
    today: Weekday,
) -> Vec<usize> {
    config
        .screens
        .iter()
        .enumerate()
        .filter(|(_, screen)| screen_eligible(screen, presence, today))
        .map(|(i, _)| i)
        .collect()
}

fn condition_holds(
    condition: &Condition,
    presence: &dyn PresenceLookup,
    today: Weekday,
) -> bool {
    match condition {
        Condition::UserZone {
            entity,
            zone,
            expected_state,
        } => match presence.state_of(entity) {
            Ok(state) => (state == *zone) == *expected_state,
            // Fail closed: an unanswerable lookup never satisfies the
            // condition, not even an inverted one.
            Err(_) => false,
        },
        Condition::DayOfWeek {
            days,
            expected_state,
        } => {
            let index = today.num_days_from_sunday() as u8;
            days.contains(&index) == *expected_state
        }
        // Evaluation semantics unresolved upstream; never satisfied.
        Condition::CalendarEvent { .. } => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
