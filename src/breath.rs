use std::time::{Duration, Instant};

use crate::session::SessionConfig;

/// Show the phase whisper only for the first N cycles of a run.
pub const WHISPER_CYCLES: u64 = 5;
/// How long a whisper lingers after a phase change before hiding itself.
pub const WHISPER_LINGER: Duration = Duration::from_millis(980);

const INHALE_GLYPH: &str = "▒";
const HOLD_GLYPH: &str = "▁";
const EXHALE_GLYPH: &str = "□";
const CURSOR_GLYPH: &str = "█";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
}

/// Where an elapsed cycle time falls: which full cycle, and how far into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePosition {
    pub cycle_index: u64,
    pub t_in_cycle: u64,
}

/// Split elapsed cycle seconds into cycle index and offset within the cycle.
/// `None` for degenerate configs (total cycle length zero).
pub fn position(elapsed_cycle_secs: u64, config: &SessionConfig) -> Option<CyclePosition> {
    let total = config.cycle_secs();
    if total == 0 {
        return None;
    }
    Some(CyclePosition {
        cycle_index: elapsed_cycle_secs / total,
        t_in_cycle: elapsed_cycle_secs % total,
    })
}

/// Phase membership by half-open interval:
/// `[0, inhale)` → inhale, `[inhale, inhale+hold)` → hold, rest → exhale.
pub fn phase_at(t_in_cycle: u64, config: &SessionConfig) -> Phase {
    if t_in_cycle < config.inhale_secs {
        Phase::Inhale
    } else if t_in_cycle < config.inhale_secs + config.hold_secs {
        Phase::Hold
    } else {
        Phase::Exhale
    }
}

/// Start offset and length (in seconds) of `phase` within the cycle.
pub fn phase_span(phase: Phase, config: &SessionConfig) -> (u64, u64) {
    match phase {
        Phase::Inhale => (0, config.inhale_secs),
        Phase::Hold => (config.inhale_secs, config.hold_secs),
        Phase::Exhale => (config.inhale_secs + config.hold_secs, config.exhale_secs),
    }
}

fn phase_glyph(phase: Phase) -> &'static str {
    match phase {
        Phase::Inhale => INHALE_GLYPH,
        Phase::Hold => HOLD_GLYPH,
        Phase::Exhale => EXHALE_GLYPH,
    }
}

/// Glyph row for the active phase only, one marker per second of the phase,
/// with the current second rendered as the cursor glyph. Uncentered; the
/// layout centers it into the breath region.
///
/// Empty for degenerate configs.
pub fn active_row(elapsed_cycle_secs: u64, config: &SessionConfig) -> String {
    let Some(pos) = position(elapsed_cycle_secs, config) else {
        return String::new();
    };
    let phase = phase_at(pos.t_in_cycle, config);
    let (offset, len) = phase_span(phase, config);
    let phase_index = pos.t_in_cycle - offset;

    let glyph = phase_glyph(phase);
    let row: Vec<&str> = (0..len)
        .map(|i| if i == phase_index { CURSOR_GLYPH } else { glyph })
        .collect();
    row.join(" ")
}

/// Non-animating full-cycle row used as the visual handoff cue during a
/// pattern switch: every second of the cycle as its phase glyph, with `|`
/// separators around the hold block. Separators are omitted when `hold` is
/// zero, since there is no hold block to bracket.
pub fn neutral_row(config: &SessionConfig) -> String {
    let total = config.cycle_secs();
    if total == 0 {
        return String::new();
    }

    let mut row: Vec<&str> = Vec::with_capacity(total as usize + 2);
    for i in 0..total {
        row.push(phase_glyph(phase_at(i, config)));
        if config.hold_secs > 0 {
            if i + 1 == config.inhale_secs {
                row.push("|");
            }
            if i + 1 == config.inhale_secs + config.hold_secs {
                row.push("|");
            }
        }
    }
    row.join(" ")
}

/// Phase-name label shown under the glyph row early in a run.
///
/// The word appears when the phase changes, hides itself once its deadline
/// passes, and stops appearing entirely after [`WHISPER_CYCLES`] full cycles.
/// Visibility is recomputed on every render call, not on its own timer.
#[derive(Debug, Clone, Default)]
pub struct PhaseWhisper {
    last_phase: Option<Phase>,
    word: Option<String>,
    hide_at: Option<Instant>,
}

impl PhaseWhisper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything: next render starts a fresh whisper window.
    pub fn reset(&mut self) {
        self.last_phase = None;
        self.word = None;
        self.hide_at = None;
    }

    /// Current label, if any, for the given elapsed cycle time.
    pub fn label(
        &mut self,
        elapsed_cycle_secs: u64,
        config: &SessionConfig,
        now: Instant,
    ) -> Option<String> {
        let pos = position(elapsed_cycle_secs, config)?;
        let phase = phase_at(pos.t_in_cycle, config);

        if pos.cycle_index < WHISPER_CYCLES {
            if self.last_phase != Some(phase) {
                self.last_phase = Some(phase);
                self.word = Some(phase.to_string());
                self.hide_at = Some(now + WHISPER_LINGER);
            }
        } else {
            self.word = None;
        }

        if let Some(hide_at) = self.hide_at {
            if now > hide_at {
                self.word = None;
            }
        }

        self.word.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn de_stress() -> SessionConfig {
        SessionConfig::new("De-stress", 4, 1, 6)
    }

    #[test]
    fn test_phase_intervals_cover_cycle() {
        let cfg = de_stress();
        let total = cfg.cycle_secs();
        let mut lens = [0u64; 3];
        for t in 0..total {
            match phase_at(t, &cfg) {
                Phase::Inhale => lens[0] += 1,
                Phase::Hold => lens[1] += 1,
                Phase::Exhale => lens[2] += 1,
            }
        }
        assert_eq!(lens, [4, 1, 6]);
        assert_eq!(lens.iter().sum::<u64>(), total);
    }

    #[test]
    fn test_cycle_boundary_wraps_4_1_6() {
        let cfg = de_stress();
        // t=10: exhale, phase-local index 5 (last exhale position)
        let pos = position(10, &cfg).unwrap();
        assert_eq!(pos.cycle_index, 0);
        assert_eq!(phase_at(pos.t_in_cycle, &cfg), Phase::Exhale);
        let (offset, _) = phase_span(Phase::Exhale, &cfg);
        assert_eq!(pos.t_in_cycle - offset, 5);

        // t=11: next cycle, back to inhale position 0
        let pos = position(11, &cfg).unwrap();
        assert_eq!(pos.cycle_index, 1);
        assert_eq!(pos.t_in_cycle, 0);
        assert_eq!(phase_at(0, &cfg), Phase::Inhale);
    }

    #[test]
    fn test_active_row_marks_cursor() {
        let cfg = de_stress();
        assert_eq!(active_row(0, &cfg), "█ ▒ ▒ ▒");
        assert_eq!(active_row(2, &cfg), "▒ ▒ █ ▒");
        // hold phase is a single marker
        assert_eq!(active_row(4, &cfg), "█");
        // first exhale second
        assert_eq!(active_row(5, &cfg), "█ □ □ □ □ □");
    }

    #[test]
    fn test_active_row_empty_for_zero_total() {
        let cfg = SessionConfig::new("broken", 0, 0, 0);
        assert_eq!(active_row(3, &cfg), "");
        assert!(position(3, &cfg).is_none());
    }

    #[test]
    fn test_neutral_row_hold_separators() {
        let cfg = de_stress();
        assert_eq!(neutral_row(&cfg), "▒ ▒ ▒ ▒ | ▁ | □ □ □ □ □ □");
    }

    #[test]
    fn test_neutral_row_omits_separators_without_hold() {
        let cfg = SessionConfig::new("Energize", 2, 0, 2);
        assert_eq!(neutral_row(&cfg), "▒ ▒ □ □");
    }

    #[test]
    fn test_phase_display_lowercase() {
        assert_eq!(Phase::Inhale.to_string(), "inhale");
        assert_eq!(Phase::Hold.to_string(), "hold");
        assert_eq!(Phase::Exhale.to_string(), "exhale");
    }

    #[test]
    fn test_whisper_appears_on_phase_change() {
        let cfg = de_stress();
        let mut w = PhaseWhisper::new();
        let t0 = Instant::now();
        assert_eq!(w.label(0, &cfg, t0), Some("inhale".into()));
        // same phase, still within linger
        assert_eq!(w.label(1, &cfg, t0), Some("inhale".into()));
    }

    #[test]
    fn test_whisper_hides_after_deadline() {
        let cfg = de_stress();
        let mut w = PhaseWhisper::new();
        let t0 = Instant::now();
        w.label(0, &cfg, t0);
        let later = t0 + WHISPER_LINGER + Duration::from_millis(1);
        assert_eq!(w.label(1, &cfg, later), None);
        // next phase change brings it back
        assert_eq!(w.label(4, &cfg, later), Some("hold".into()));
    }

    #[test]
    fn test_whisper_stops_after_cycle_limit() {
        let cfg = de_stress();
        let mut w = PhaseWhisper::new();
        let t0 = Instant::now();
        let deep = WHISPER_CYCLES * cfg.cycle_secs();
        assert_eq!(w.label(deep, &cfg, t0), None);
    }

    #[test]
    fn test_whisper_reset_restarts_window() {
        let cfg = de_stress();
        let mut w = PhaseWhisper::new();
        let t0 = Instant::now();
        w.label(0, &cfg, t0);
        w.reset();
        assert_eq!(w.label(0, &cfg, t0), Some("inhale".into()));
    }
}
