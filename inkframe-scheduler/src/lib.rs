//! # inkframe-scheduler
//!
//! Pure decision logic for the display orchestrator: condition evaluation
//! and screen selection. No I/O lives here — external presence state
//! arrives through the [`PresenceLookup`] trait and the wall clock through
//! [`TickClock`], so every path is deterministic under test.
//!
//! Selection priority, per evaluation tick:
//! 1. eligible screens flagged `force_show_if_conditions_match` (rotation)
//! 2. first eligible screen whose time window contains the current minute
//! 3. rotation over eligible screens without a time window
//! 4. otherwise no change

pub mod conditions;
pub mod select;

pub use conditions::{
    eligible_screens, screen_eligible, LookupError, NoPresence, PresenceLookup,
};
pub use select::{select_screen, PoolKind, SchedulerState, TickClock};
