use std::time::{Duration, Instant};

/// Dual elapsed-time source for one practice run.
///
/// Two origins: the session clock keeps counting across pattern switches, the
/// cycle clock restarts whenever the breathing pattern changes. While frozen
/// (app backgrounded mid-run) both report the frozen snapshot.
///
/// Every operation takes `now` explicitly, so the clock is a total function
/// of its state and wall-clock time.
#[derive(Debug, Clone)]
pub struct SessionClock {
    session_origin: Instant,
    cycle_origin: Instant,
    frozen_secs: Option<u64>,
}

impl SessionClock {
    /// Start a fresh run: both origins at `now`, nothing frozen.
    pub fn start(now: Instant) -> Self {
        Self {
            session_origin: now,
            cycle_origin: now,
            frozen_secs: None,
        }
    }

    /// Restart only the cycle clock (pattern switch). Session time continues.
    pub fn restart_cycle(&mut self, now: Instant) {
        self.cycle_origin = now;
    }

    /// Capture the current session elapsed as a frozen snapshot. Idempotent.
    pub fn freeze(&mut self, now: Instant) {
        if self.frozen_secs.is_none() {
            self.frozen_secs = Some(self.elapsed_session(now));
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_secs.is_some()
    }

    /// Undo a freeze. Idempotent.
    ///
    /// The session origin is shifted back by the frozen seconds so elapsed
    /// time resumes where it left off; the cycle origin is recomputed as
    /// `now - (frozen mod cycle_total)` so the breath phase picks up at the
    /// same point within its cycle.
    pub fn resume(&mut self, now: Instant, cycle_total_secs: u64) {
        let Some(frozen) = self.frozen_secs.take() else {
            return;
        };
        self.session_origin = now - Duration::from_secs(frozen);
        self.cycle_origin = if cycle_total_secs > 0 {
            now - Duration::from_secs(frozen % cycle_total_secs)
        } else {
            now
        };
    }

    /// Whole seconds since the run started (frozen snapshot while frozen).
    pub fn elapsed_session(&self, now: Instant) -> u64 {
        match self.frozen_secs {
            Some(s) => s,
            None => now.saturating_duration_since(self.session_origin).as_secs(),
        }
    }

    /// Whole seconds since the current cycle clock origin.
    pub fn elapsed_cycle(&self, now: Instant) -> u64 {
        match self.frozen_secs {
            Some(s) => s,
            None => now.saturating_duration_since(self.cycle_origin).as_secs(),
        }
    }
}
