use std::time::{Duration, Instant};

use serde_json::Value;

use crate::breath::{self, PhaseWhisper};
use crate::clock::SessionClock;
use crate::events::{Classifier, Intent};
use crate::fade::{FadeElement, FadeStage};
use crate::gate::Gate;
use crate::layout;
use crate::render::{DisplayBridge, Region, RenderCache, RenderError};
use crate::session::SessionRegistry;
use crate::store::{self, KvStore};

/// Watcher/poll cadence. Fade triggers must land close to a cycle boundary,
/// so this is much shorter than the 1 Hz display refresh.
pub const POLL_INTERVAL: Duration = Duration::from_millis(60);

/// Handoff pause between the neutral switch cue and the first animated frame.
pub const SWITCH_SETTLE: Duration = Duration::from_millis(180);

/// How long the debug overlay shows the last raw event code.
const DEBUG_EVENT_LINGER: Duration = Duration::from_millis(1200);

/// The whole practice overlay state machine.
///
/// Top-level states are Collapsed, Expanded-Running and Expanded-Paused
/// (foreground lost mid-run), encoded by the `expanded`/`running`/
/// `foreground` flags with the invariants `running ⇒ expanded` and
/// "clock exists iff running".
///
/// Collaborators (display bridge, key-value store) are passed into each
/// operation rather than owned, so tests can drive the engine headless with
/// a recording bridge, a memory store and synthetic instants.
#[derive(Debug)]
pub struct Practice {
    expanded: bool,
    running: bool,
    foreground: bool,
    exiting: bool,

    registry: SessionRegistry,
    clock: Option<SessionClock>,
    whisper: PhaseWhisper,
    header: FadeElement,
    frame: FadeElement,

    /// Today's committed practice seconds, loaded at startup.
    accum_base_secs: u64,
    /// Armed at session start, disarmed after the one commit per run.
    accrual_armed: bool,

    switch_gate: Gate,
    render_gate: Gate,
    /// Deadline for the post-switch first animated frame; the switch gate
    /// stays held until it passes.
    switch_settle_at: Option<Instant>,

    classifier: Classifier,
    cache: RenderCache,
    ui_ready: bool,
    last_render_second: Option<u64>,

    debug: bool,
    debug_text: Option<String>,
    debug_until: Option<Instant>,
}

impl Practice {
    pub fn new(registry: SessionRegistry, debug: bool) -> Self {
        Self {
            expanded: false,
            running: false,
            foreground: true,
            exiting: false,
            registry,
            clock: None,
            whisper: PhaseWhisper::new(),
            header: FadeElement::header(),
            frame: FadeElement::frame(),
            accum_base_secs: 0,
            accrual_armed: false,
            switch_gate: Gate::new(),
            render_gate: Gate::new(),
            switch_settle_at: None,
            classifier: Classifier::new(),
            cache: RenderCache::new(),
            ui_ready: false,
            last_render_second: None,
            debug,
            debug_text: None,
            debug_until: None,
        }
    }

    // -- observers (used by the front end and tests) --

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn header_stage(&self) -> FadeStage {
        self.header.stage()
    }

    pub fn frame_stage(&self) -> FadeStage {
        self.frame.stage()
    }

    pub fn session_index(&self) -> usize {
        self.registry.current_index()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn accum_secs_today(&self) -> u64 {
        self.accum_base_secs
    }

    pub fn elapsed_session(&self, now: Instant) -> u64 {
        self.clock.as_ref().map_or(0, |c| c.elapsed_session(now))
    }

    pub fn elapsed_cycle(&self, now: Instant) -> u64 {
        self.clock.as_ref().map_or(0, |c| c.elapsed_cycle(now))
    }

    // -- lifecycle --

    /// Restore persisted state and paint the initial collapsed UI.
    ///
    /// The initial page build is the only fatal render call: if the display
    /// cannot build the startup page there is nothing to run.
    pub fn startup(
        &mut self,
        bridge: &mut dyn DisplayBridge,
        store: &mut dyn KvStore,
    ) -> Result<(), RenderError> {
        self.accum_base_secs = store::load_accum_seconds_today(store);
        let idx = store::load_last_session_idx(store, self.registry.len());
        self.registry.select(idx as i64);

        self.expanded = false;
        self.running = false;
        self.foreground = true;
        self.clock = None;
        self.header.reset();
        self.frame.reset();
        self.ui_ready = false;
        self.cache.reset();

        self.rebuild_ui(bridge, Instant::now())
    }

    /// Final teardown: commit any uncommitted run time, then refuse further
    /// gestures. Safe to call from multiple exit paths.
    pub fn stop(&mut self, store: &mut dyn KvStore, now: Instant) {
        self.commit_elapsed(store, now);
        if self.exiting {
            return;
        }
        self.exiting = true;
        self.header.disarm();
        self.frame.disarm();
    }

    // -- event handling --

    /// Classify a raw device payload and handle the resulting intent.
    /// Malformed payloads are a no-op.
    pub fn handle_raw(
        &mut self,
        payload: &Value,
        bridge: &mut dyn DisplayBridge,
        store: &mut dyn KvStore,
        now: Instant,
    ) {
        if self.debug {
            if let Some(code) = crate::events::extract_event_code(payload) {
                self.debug_text = Some(format!("evt:{}", code));
                self.debug_until = Some(now + DEBUG_EVENT_LINGER);
                let text = self.debug_text.clone().unwrap_or_default();
                let _ = self.cache.push(bridge, Region::Debug, &text);
            }
        }
        if let Some(intent) = self.classifier.classify(payload) {
            self.handle_intent(intent, bridge, store, now);
        }
    }

    pub fn handle_intent(
        &mut self,
        intent: Intent,
        bridge: &mut dyn DisplayBridge,
        store: &mut dyn KvStore,
        now: Instant,
    ) {
        match intent {
            Intent::ForegroundExit => {
                self.foreground = false;
                if self.expanded && self.running {
                    if let Some(clock) = self.clock.as_mut() {
                        clock.freeze(now);
                    }
                    // Visibility loss is a termination path as far as the
                    // daily total is concerned.
                    self.commit_elapsed(store, now);
                }
            }
            Intent::ForegroundEnter => {
                self.foreground = true;
                if self.expanded && self.running {
                    let cycle_total = self.registry.current().cycle_secs();
                    if let Some(clock) = self.clock.as_mut() {
                        clock.resume(now, cycle_total);
                    }
                }
            }
            // Gestures are dropped while backgrounded or shutting down.
            Intent::Tap if self.foreground && !self.exiting => {
                self.handle_tap(bridge, store, now);
            }
            Intent::SwipeUp if self.foreground && !self.exiting => {
                if self.expanded {
                    self.switch_session(-1, bridge, store, now);
                }
            }
            Intent::SwipeDown if self.foreground && !self.exiting => {
                if self.expanded {
                    self.switch_session(1, bridge, store, now);
                }
            }
            Intent::Tap | Intent::SwipeUp | Intent::SwipeDown => {}
        }
    }

    fn handle_tap(
        &mut self,
        bridge: &mut dyn DisplayBridge,
        store: &mut dyn KvStore,
        now: Instant,
    ) {
        if !self.expanded {
            self.start_run(bridge, now);
        } else if self.running {
            self.commit_elapsed(store, now);
            self.collapse(bridge);
        } else {
            // Shouldn't happen (paused implies backgrounded, which drops
            // taps), but a stray tap still lands us somewhere sane.
            self.collapse(bridge);
        }
    }

    /// Collapsed + tap: expand into a fresh running session.
    fn start_run(&mut self, bridge: &mut dyn DisplayBridge, now: Instant) {
        self.expanded = true;
        self.running = true;

        self.whisper.reset();
        self.header.reset();
        self.frame.reset();
        self.switch_settle_at = None;
        self.switch_gate.release();

        self.clock = Some(SessionClock::start(now));
        self.accrual_armed = true;
        self.last_render_second = None;

        let _ = self.rebuild_ui(bridge, now);

        self.header.arm();
        self.frame.arm();
    }

    /// Back to the collapsed badge; the run (if any) is already committed.
    fn collapse(&mut self, bridge: &mut dyn DisplayBridge) {
        self.running = false;
        self.expanded = false;
        self.clock = None;
        self.header.reset();
        self.frame.reset();
        self.whisper.reset();
        self.switch_settle_at = None;
        self.switch_gate.release();
        self.last_render_second = None;

        let _ = self.rebuild_ui(bridge, Instant::now());
    }

    // -- session switching --

    /// Swipe: advance the pattern by ±1 with a neutral handoff cue.
    ///
    /// Single-flight: a switch arriving while one is in progress is dropped.
    /// The session clock keeps running; only the cycle clock restarts.
    fn switch_session(
        &mut self,
        direction: i64,
        bridge: &mut dyn DisplayBridge,
        store: &mut dyn KvStore,
        now: Instant,
    ) {
        if !self.switch_gate.try_acquire() {
            return;
        }

        // Chrome back to full emphasis, watchers cancelled.
        self.header.reset();
        self.frame.reset();

        // Neutral cue of the pattern we are leaving.
        let neutral = layout::breath_body(&breath::neutral_row(self.registry.current()), None);
        let _ = self.cache.push(bridge, Region::Breath, &neutral);

        let next = self.registry.neighbor(direction);
        let idx = self.registry.select(next);
        store::save_last_session_idx(store, idx);

        self.whisper.reset();
        if let Some(clock) = self.clock.as_mut() {
            clock.restart_cycle(now);
        }

        let _ = self.rebuild_ui(bridge, now);

        // First animated frame and watcher re-arm happen once the settle
        // passes; the switch gate stays held until then.
        self.switch_settle_at = Some(now + SWITCH_SETTLE);
    }

    // -- polling --

    /// One cooperative scheduler step, run every poll interval.
    ///
    /// Drives, in order: pending fade dwells, the two fade watchers, the
    /// switch settle deadline, and the 1 Hz display refresh.
    pub fn on_poll(&mut self, bridge: &mut dyn DisplayBridge, now: Instant) {
        if self.header.poll(now) | self.frame.poll(now) {
            let _ = self.rebuild_ui(bridge, now);
        }

        self.poll_fade_watchers(bridge, now);

        if let Some(settle_at) = self.switch_settle_at {
            if now >= settle_at {
                self.switch_settle_at = None;
                let body = self.breath_content(now);
                let _ = self.cache.push(bridge, Region::Breath, &body);
                self.header.arm();
                self.frame.arm();
                self.switch_gate.release();
            }
        }

        self.tick_render(bridge, now);
    }

    fn poll_fade_watchers(&mut self, bridge: &mut dyn DisplayBridge, now: Instant) {
        if !(self.expanded && self.running && self.foreground) {
            return;
        }
        if self.switch_gate.is_held() || self.render_gate.is_held() {
            return;
        }
        let Some(pos) = breath::position(self.elapsed_cycle(now), self.registry.current()) else {
            return;
        };

        if self.header.should_fire(pos) && self.header.fire(now) {
            let _ = self.rebuild_ui(bridge, now);
        }
        if self.frame.should_fire(pos) && self.frame.fire(now) {
            let _ = self.rebuild_ui(bridge, now);
        }
    }

    /// Per-second refresh of the breath row and the header clock. Gated on
    /// the elapsed second changing so the short poll interval still renders
    /// at 1 Hz.
    fn tick_render(&mut self, bridge: &mut dyn DisplayBridge, now: Instant) {
        if !(self.expanded && self.running && self.foreground) {
            return;
        }
        if self.switch_gate.is_held() {
            return;
        }

        let second = self.elapsed_session(now);
        if self.last_render_second == Some(second) {
            return;
        }
        if !self.render_gate.try_acquire() {
            return;
        }
        self.last_render_second = Some(second);

        let body = self.breath_content(now);
        let _ = self.cache.push(bridge, Region::Breath, &body);

        if self.header.stage() < FadeStage::Off {
            let header = self.header_content(now);
            let _ = self.cache.push(bridge, Region::Header, &header);
        }

        if self.debug {
            if let (Some(text), Some(until)) = (&self.debug_text, self.debug_until) {
                let shown = if now < until { text.clone() } else { String::new() };
                let _ = self.cache.push(bridge, Region::Debug, &shown);
            }
        }

        self.render_gate.release();
    }

    // -- content --

    fn header_content(&self, now: Instant) -> String {
        let cfg = self.registry.current();
        let cycle_index = breath::position(self.elapsed_cycle(now), cfg)
            .map_or(0, |p| p.cycle_index);
        let live = self.accum_base_secs + self.elapsed_session(now);
        layout::header_text(cfg, live, cycle_index)
    }

    fn breath_content(&mut self, now: Instant) -> String {
        let cfg = self.registry.current().clone();
        let elapsed = self.elapsed_cycle(now);
        let row = breath::active_row(elapsed, &cfg);
        let word = self.whisper.label(elapsed, &cfg, now);
        layout::breath_body(&row, word.as_deref())
    }

    /// Full create-or-rebuild of the page for the current mode.
    ///
    /// Only the very first build (startup) can fail fatally; rebuilds are
    /// swallowed by callers and retried by the next tick's pushes.
    fn rebuild_ui(
        &mut self,
        bridge: &mut dyn DisplayBridge,
        now: Instant,
    ) -> Result<(), RenderError> {
        if !self.render_gate.try_acquire() {
            return Ok(());
        }
        let result = self.rebuild_ui_inner(bridge, now);
        self.render_gate.release();
        result
    }

    fn rebuild_ui_inner(
        &mut self,
        bridge: &mut dyn DisplayBridge,
        now: Instant,
    ) -> Result<(), RenderError> {
        let page = if self.expanded {
            layout::expanded_page(
                self.header.stage(),
                self.frame.stage(),
                self.header_content(now),
                self.breath_content(now),
                self.debug,
            )
        } else {
            layout::collapsed_page(self.accum_base_secs, self.debug)
        };

        if !self.ui_ready {
            bridge.create_page(&page)?;
            self.ui_ready = true;
        } else {
            let _ = bridge.rebuild_page(&page);
        }
        self.cache.reset();
        Ok(())
    }

    // -- accumulation guard --

    /// Exactly-once commit of this run's elapsed seconds into today's total.
    ///
    /// Triggered from collapse, visibility loss and final stop; whichever
    /// fires first wins, the rest are no-ops. Store failures cost the run's
    /// time but never the session.
    pub fn commit_elapsed(&mut self, store: &mut dyn KvStore, now: Instant) {
        if !self.expanded || !self.running {
            return;
        }
        if !self.accrual_armed {
            return;
        }
        let elapsed = self.elapsed_session(now);
        if elapsed == 0 {
            return;
        }

        // Re-check the day on commit; practice can straddle midnight.
        self.accum_base_secs = store::load_accum_seconds_today(store) + elapsed;
        store::save_accum_seconds_today(store, self.accum_base_secs);
        self.accrual_armed = false;
    }
}
