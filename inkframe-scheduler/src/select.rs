//! Screen selection state machine.
//!
//! `select_screen` resolves the target screen for one evaluation tick in
//! strict priority order: forced screens, then scheduled windows, then
//! duration-based rotation. Rotation bookkeeping (index + switch timer) is
//! keyed by which candidate pool produced the active screen; changing pool
//! kind resets it.

use rand::Rng;

use inkframe_core::types::{window_contains, DisplayConfig, ScreenSpec, TimeOfDay};

/// Which selection branch produced the active screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Forced,
    Windowed,
    Rotation,
}

/// Clock inputs for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    /// Milliseconds on a monotonically increasing clock; only differences
    /// matter. Must be positive (0 is the "never switched" sentinel).
    pub now_ms: i64,
    /// Wall-clock time of day for window containment.
    pub time_of_day: TimeOfDay,
}

/// Process-lifetime scheduler state, mutated only by [`select_screen`] and
/// [`SchedulerState::record_navigation`].
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pool_kind: Option<PoolKind>,
    rotation_index: usize,
    last_switch_ms: i64,
    active_url: Option<String>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The branch that produced the current selection, if any yet.
    pub fn pool_kind(&self) -> Option<PoolKind> {
        self.pool_kind
    }

    pub fn rotation_index(&self) -> usize {
        self.rotation_index
    }

    /// URL last instructed to the renderer.
    pub fn active_url(&self) -> Option<&str> {
        self.active_url.as_deref()
    }

    /// Record that navigation to `url` was issued. Called regardless of
    /// navigation success so a persistently failing page is not retried in
    /// a tight loop.
    pub fn record_navigation(&mut self, url: &str) {
        self.active_url = Some(url.to_owned());
    }

    /// Whether selecting `url` requires issuing a navigation.
    pub fn needs_navigation(&self, url: &str) -> bool {
        self.active_url.as_deref() != Some(url)
    }

    fn enter_pool(&mut self, kind: PoolKind) {
        if self.pool_kind != Some(kind) {
            self.pool_kind = Some(kind);
            self.rotation_index = 0;
            self.last_switch_ms = 0;
        }
    }
}

/// Resolve the target screen for this tick.
///
/// `eligible` holds indices into `config.screens` whose conditions all
/// hold, in config order (see [`crate::conditions::eligible_screens`]).
/// Returns `None` when no branch produces a candidate; the renderer then
/// keeps showing whatever was last set.
pub fn select_screen<'a>(
    config: &'a DisplayConfig,
    eligible: &[usize],
    clock: TickClock,
    state: &mut SchedulerState,
    rng: &mut impl Rng,
) -> Option<&'a ScreenSpec> {
    // 1. Forced screens override everything, including active windows.
    let forced: Vec<usize> = eligible
        .iter()
        .copied()
        .filter(|&i| config.screens[i].force_show_if_conditions_match)
        .collect();
    if !forced.is_empty() {
        let index = rotate(config, &forced, clock, state, PoolKind::Forced, rng);
        return Some(&config.screens[index]);
    }

    // 2. First eligible screen in config order with an active window.
    for &i in eligible {
        let screen = &config.screens[i];
        if let Some((start, end)) = screen.window() {
            if window_contains(start, end, clock.time_of_day) {
                state.enter_pool(PoolKind::Windowed);
                return Some(screen);
            }
        }
    }

    // 3. Duration-based rotation over the windowless eligible screens.
    let pool: Vec<usize> = eligible
        .iter()
        .copied()
        .filter(|&i| !config.screens[i].has_window())
        .collect();
    if pool.is_empty() {
        return None;
    }
    let index = rotate(config, &pool, clock, state, PoolKind::Rotation, rng);
    Some(&config.screens[index])
}

/// Rotation over a non-empty pool of screen indices.
fn rotate(
    config: &DisplayConfig,
    pool: &[usize],
    clock: TickClock,
    state: &mut SchedulerState,
    kind: PoolKind,
    rng: &mut impl Rng,
) -> usize {
    state.enter_pool(kind);

    // Pool shrank since the last tick.
    if state.rotation_index >= pool.len() {
        state.rotation_index = 0;
    }

    let duration_ms = config.screens[pool[state.rotation_index]].duration_ms();

    if state.last_switch_ms == 0 {
        // Never switched: treat as "just switched now" without advancing.
        state.last_switch_ms = clock.now_ms;
    } else if clock.now_ms - state.last_switch_ms > duration_ms {
        state.rotation_index = if config.randomize_screens {
            random_other_index(pool.len(), state.rotation_index, rng)
        } else {
            (state.rotation_index + 1) % pool.len()
        };
        state.last_switch_ms = clock.now_ms;
    }

    pool[state.rotation_index]
}

/// Uniform index in `[0, len)`, different from `current` whenever
/// `len > 1`.
fn random_other_index(len: usize, current: usize, rng: &mut impl Rng) -> usize {
    if len <= 1 {
        return 0;
    }
    loop {
        let candidate = rng.gen_range(0..len);
        if candidate != current {
            return candidate;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
