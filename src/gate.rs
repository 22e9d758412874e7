/// Single-slot, non-reentrant guard for one logical operation at a time.
///
/// A trigger that finds the gate held is dropped, not queued; that is the
/// debounce behavior for rapid repeated gestures and overlapping render
/// passes. Cooperative single-threaded use only, hence no atomics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gate {
    busy: bool,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate if it is free. Returns whether it was acquired.
    #[must_use]
    pub fn try_acquire(&mut self) -> bool {
        if self.busy {
            false
        } else {
            self.busy = true;
            true
        }
    }

    pub fn release(&mut self) {
        self.busy = false;
    }

    pub fn is_held(&self) -> bool {
        self.busy
    }
}
