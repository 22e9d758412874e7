/// One breathing pattern: named inhale/hold/exhale durations in whole seconds.
///
/// Immutable after load; the registry owns all configs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub name: &'static str,
    pub inhale_secs: u64,
    pub hold_secs: u64,
    pub exhale_secs: u64,
}

impl SessionConfig {
    pub const fn new(name: &'static str, inhale: u64, hold: u64, exhale: u64) -> Self {
        Self {
            name,
            inhale_secs: inhale,
            hold_secs: hold,
            exhale_secs: exhale,
        }
    }

    /// Length of one full inhale-hold-exhale cycle.
    pub fn cycle_secs(&self) -> u64 {
        self.inhale_secs + self.hold_secs + self.exhale_secs
    }

    /// Compact pattern hint shown in the header for the first cycles, e.g. `4-1-6`.
    pub fn pattern_hint(&self) -> String {
        format!("{}-{}-{}", self.inhale_secs, self.hold_secs, self.exhale_secs)
    }
}

/// Built-in breathing patterns, in swipe order.
pub const BUILTIN_SESSIONS: &[SessionConfig] = &[
    SessionConfig::new("De-stress", 4, 1, 6),
    SessionConfig::new("Stabilize", 4, 4, 4),
    SessionConfig::new("Energize", 2, 0, 2),
    SessionConfig::new("Release", 3, 0, 5),
    SessionConfig::new("Deep calm", 4, 7, 8),
];

/// Ordered, cyclic list of breathing patterns plus the current selection.
///
/// The current index only changes through [`SessionRegistry::select`] (the
/// switch protocol in the engine) and always stays in bounds; stepping off
/// either end wraps around.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    configs: Vec<SessionConfig>,
    current: usize,
}

impl SessionRegistry {
    /// Build a registry from a non-empty config list.
    ///
    /// Panics on an empty list; the built-in set is never empty and there is
    /// no user-supplied config path.
    pub fn new(configs: Vec<SessionConfig>) -> Self {
        assert!(!configs.is_empty(), "session registry must not be empty");
        Self {
            configs,
            current: 0,
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_SESSIONS.to_vec())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &SessionConfig {
        &self.configs[self.current]
    }

    /// Wrap an arbitrary (possibly negative) index into registry bounds.
    pub fn wrap(&self, idx: i64) -> usize {
        idx.rem_euclid(self.configs.len() as i64) as usize
    }

    /// Set the current selection, wrapping into bounds. Returns the new index.
    pub fn select(&mut self, idx: i64) -> usize {
        self.current = self.wrap(idx);
        self.current
    }

    /// Index one step in `direction` (+1 next, -1 previous) from the current.
    pub fn neighbor(&self, direction: i64) -> i64 {
        self.current as i64 + direction
    }
}
