//! Hashed timing wheel with O(1) schedule and bounded per-advance work.
//!
//! Single-level, power-of-two slots, one tick per millisecond. There is no
//! cancel: the only pending work is scheduled channel initialization, and
//! an aborted channel is detected at fire time instead. Due timers stream
//! out via callback to avoid per-advance allocation.

/// One scheduled payload.
#[derive(Debug)]
struct TimerEntry<T> {
    /// Absolute deadline in ticks.
    deadline: u64,
    payload: T,
}

/// Hashed timing wheel.
#[derive(Debug)]
pub struct TimerWheel<T> {
    slots: Vec<Vec<TimerEntry<T>>>,
    mask: u64,
    /// Current tick; entries fire once the cursor reaches their deadline.
    cursor: u64,
    pending: usize,
}

impl<T> TimerWheel<T> {
    /// Creates a wheel with at least `slots` slots (rounded up to a power
    /// of two).
    #[must_use]
    pub fn new(slots: usize) -> Self {
        let count = slots.next_power_of_two().max(1);
        Self {
            slots: (0..count).map(|_| Vec::new()).collect(),
            mask: (count - 1) as u64,
            cursor: 0,
            pending: 0,
        }
    }

    /// Schedules `payload` to fire `delay` ticks from now.
    ///
    /// A zero delay is promoted to one tick: the wheel never fires within
    /// the call that scheduled, only from `advance`.
    pub fn schedule(&mut self, delay: u64, payload: T) {
        let deadline = self.cursor + delay.max(1);
        let slot = (deadline & self.mask) as usize;
        self.slots[slot].push(TimerEntry { deadline, payload });
        self.pending += 1;
    }

    /// Advances the wheel to `now` and invokes `on_fire` for each due
    /// payload. Entries scheduled for a later lap of their slot are kept.
    pub fn advance(&mut self, now: u64, mut on_fire: impl FnMut(T)) {
        if now <= self.cursor {
            return;
        }
        // Each slot only needs one visit per advance, however far the
        // cursor jumps.
        let span = (now - self.cursor).min(self.slots.len() as u64);
        for step in 1..=span {
            let slot = ((self.cursor + step) & self.mask) as usize;
            let entries = std::mem::take(&mut self.slots[slot]);
            for entry in entries {
                if entry.deadline <= now {
                    self.pending -= 1;
                    on_fire(entry.payload);
                } else {
                    self.slots[slot].push(entry);
                }
            }
        }
        self.cursor = now;
    }

    /// Number of scheduled, not-yet-fired payloads.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// True when nothing is scheduled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pending == 0
    }
}
