use std::time::{Duration, Instant};

/// Fixed-interval scheduler for the display tick, driven from the GUI loop.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next_due: Instant,
}

impl FramePacer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        if self.interval != interval {
            self.interval = interval;
            self.next_due = self.next_due.min(now + interval);
        }
    }

    /// True at most once per interval. Missed ticks are skipped, not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }

        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }

    /// Delay to hand to the toolkit's repaint scheduler.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}
