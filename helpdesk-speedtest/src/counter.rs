use std::time::Duration;

/// Tick length of the counter animation.
pub const COUNTER_TICK: Duration = Duration::from_millis(16);

/// Linear count from `start` to `end` over a fixed duration in 16 ms ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearCounter {
    current: f64,
    end: f64,
    increment: f64,
    done: bool,
}

impl LinearCounter {
    pub fn new(start: f64, end: f64, duration: Duration) -> Self {
        let ticks = (duration.as_millis() as f64 / COUNTER_TICK.as_millis() as f64).max(1.0);
        let increment = (end - start) / ticks;

        Self {
            current: start,
            end,
            increment,
            done: increment == 0.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance one tick and return the rounded value to display.
    pub fn tick(&mut self) -> i64 {
        if !self.done {
            self.current += self.increment;
            let overshot = (self.increment > 0.0 && self.current >= self.end)
                || (self.increment < 0.0 && self.current <= self.end);
            if overshot {
                self.current = self.end;
                self.done = true;
            }
        }

        self.current.round() as i64
    }
}
