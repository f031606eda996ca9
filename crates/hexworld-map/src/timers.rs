//! Per-map periodic loop timers.

use smallvec::SmallVec;

/// Number of independent loop timers per map.
pub const LOOP_COUNT: usize = 5;

/// Five independent periodic timers driven by a caller-supplied clock.
///
/// A timer with period 0 never fires. A timer fires when at least one
/// period has elapsed since it last fired; missed periods collapse into a
/// single firing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopTimers {
    periods: [u32; LOOP_COUNT],
    last_fire: [u64; LOOP_COUNT],
}

impl LoopTimers {
    /// Timers with the given periods, all last fired at `now_ms`.
    pub fn new(periods: [u32; LOOP_COUNT], now_ms: u64) -> Self {
        Self {
            periods,
            last_fire: [now_ms; LOOP_COUNT],
        }
    }

    /// Period of timer `index` in milliseconds.
    pub fn period(&self, index: usize) -> u32 {
        self.periods[index]
    }

    /// Change the period of timer `index`.
    pub fn set_period(&mut self, index: usize, period_ms: u32) {
        self.periods[index] = period_ms;
    }

    /// Restart every timer from `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_fire = [now_ms; LOOP_COUNT];
    }

    /// Advance the clock and return the indices of timers that fired.
    pub fn process(&mut self, now_ms: u64) -> SmallVec<[usize; LOOP_COUNT]> {
        let mut fired = SmallVec::new();
        for i in 0..LOOP_COUNT {
            let period = u64::from(self.periods[i]);
            if period > 0 && now_ms.saturating_sub(self.last_fire[i]) >= period {
                self.last_fire[i] = now_ms;
                fired.push(i);
            }
        }
        fired
    }
}
