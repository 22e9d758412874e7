use std::time::{Duration, Instant};

use crate::breath::CyclePosition;
use crate::gate::Gate;

/// Fade the header after this many full breath cycles.
pub const HEADER_HIDE_AFTER_CYCLES: u64 = 2;
/// Fade the outer frame later, leaving the breath row floating alone.
pub const FRAME_HIDE_AFTER_CYCLES: u64 = 4;

/// Dim-to-off dwell, paced like a slow exhale.
pub const HEADER_FADE_DWELL: Duration = Duration::from_millis(380);
pub const FRAME_FADE_DWELL: Duration = Duration::from_millis(420);

/// Visual emphasis of a chrome element. Strictly forward within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FadeStage {
    Normal,
    Dim,
    Off,
}

/// Per-element fade controller (header or outer frame).
///
/// While armed, a watcher polls [`FadeElement::should_fire`] on every engine
/// poll tick; it fires only at an inhale boundary (`t_in_cycle == 0`) at or
/// past the cycle threshold, so chrome never disappears mid-breath. Firing
/// dims the element and stores the off-deadline; [`FadeElement::poll`]
/// completes the sequence once the dwell has passed and retires the watcher,
/// so each element fades at most once per run.
#[derive(Debug, Clone)]
pub struct FadeElement {
    stage: FadeStage,
    threshold_cycles: u64,
    dwell: Duration,
    armed: bool,
    in_flight: Gate,
    off_deadline: Option<Instant>,
}

impl FadeElement {
    pub fn new(threshold_cycles: u64, dwell: Duration) -> Self {
        Self {
            stage: FadeStage::Normal,
            threshold_cycles,
            dwell,
            armed: false,
            in_flight: Gate::new(),
            off_deadline: None,
        }
    }

    pub fn header() -> Self {
        Self::new(HEADER_HIDE_AFTER_CYCLES, HEADER_FADE_DWELL)
    }

    pub fn frame() -> Self {
        Self::new(FRAME_HIDE_AFTER_CYCLES, FRAME_FADE_DWELL)
    }

    pub fn stage(&self) -> FadeStage {
        self.stage
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_animating(&self) -> bool {
        self.in_flight.is_held()
    }

    /// Back to full emphasis with the watcher cancelled (session start/switch).
    pub fn reset(&mut self) {
        self.stage = FadeStage::Normal;
        self.armed = false;
        self.in_flight.release();
        self.off_deadline = None;
    }

    /// Schedule the watcher for a fresh run.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Cancel the watcher without touching the visual stage. An in-flight
    /// dwell still completes via [`FadeElement::poll`].
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Watcher predicate, cycle-aligned part only. The engine gates this
    /// further on expanded/running/foreground and the switch/render gates.
    pub fn should_fire(&self, pos: CyclePosition) -> bool {
        self.armed
            && self.stage == FadeStage::Normal
            && !self.in_flight.is_held()
            && pos.cycle_index >= self.threshold_cycles
            && pos.t_in_cycle == 0
    }

    /// Begin the fade sequence: Normal → Dim now, Off once the dwell passes.
    /// Returns false (and does nothing) if a sequence is already animating.
    #[must_use]
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.in_flight.try_acquire() {
            return false;
        }
        self.stage = FadeStage::Dim;
        self.off_deadline = Some(now + self.dwell);
        true
    }

    /// Advance a pending Dim → Off step whose dwell has elapsed. Returns true
    /// when the stage changed (the caller owes a render); retires the watcher.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.off_deadline {
            Some(deadline) if now >= deadline => {
                self.stage = FadeStage::Off;
                self.off_deadline = None;
                self.in_flight.release();
                self.armed = false;
                true
            }
            _ => false,
        }
    }
}
