//! # inkframe-capture
//!
//! Perceptual-diff-gated atomic frame persistence.
//!
//! [`CaptureGate::offer`] a frame on every capture tick; the gate saves it
//! to the canonical path only when the content meaningfully changed:
//! always on the first frame, never on a byte-identical frame, and
//! otherwise when more than 0.5 % of pixels differ. Saves go through a
//! `.tmp` + rename so a concurrent reader of the canonical path never
//! observes a partial write.

pub mod diff;
pub mod error;
pub mod gate;

pub use diff::{change_ratio, CHANGE_RATIO_THRESHOLD, PER_CHANNEL_DELTA};
pub use error::CaptureError;
pub use gate::{CaptureGate, CaptureOutcome};
