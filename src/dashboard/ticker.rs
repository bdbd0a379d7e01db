//! Fixed-period tick scheduling that never queues ticks.
//!
//! Ticks are due at `start + k * period`. When the caller comes back late,
//! because a poll took longer than a period, every tick that came due in
//! the meantime except the newest is dropped. The next poll then runs
//! immediately and the schedule stays aligned to the original grid.

use std::thread;
use std::time::{Duration, Instant};

/// Shortest accepted period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What the caller should do for the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    /// Time to sleep before firing. Zero when the tick is already due.
    pub wait: Duration,
    /// Ticks skipped because the previous poll overran them.
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
}

impl Ticker {
    /// First tick is due one `period` from now.
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    pub fn starting_at(period: Duration, start: Instant) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            period,
            next_due: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Plan the next tick as seen at `now` and advance the schedule.
    pub fn plan(&mut self, now: Instant) -> TickPlan {
        if now < self.next_due {
            let wait = self.next_due - now;
            self.next_due += self.period;
            return TickPlan { wait, dropped: 0 };
        }

        // Ticks due in (next_due, now] beyond the first one are dropped.
        let behind = now.duration_since(self.next_due).as_nanos();
        let dropped = (behind / self.period.as_nanos()) as u64;
        let skip = self.period.as_nanos() * u128::from(dropped + 1);
        self.next_due += Duration::from_nanos(u64::try_from(skip).unwrap_or(u64::MAX));
        TickPlan {
            wait: Duration::ZERO,
            dropped,
        }
    }

    /// Block until the next tick. Returns the number of dropped ticks.
    pub fn wait(&mut self) -> u64 {
        let plan = self.plan(Instant::now());
        if !plan.wait.is_zero() {
            thread::sleep(plan.wait);
        }
        plan.dropped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(3000);

    #[test]
    fn on_time_caller_waits_for_next_tick() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(PERIOD, start);

        let plan = ticker.plan(start + Duration::from_millis(1000));
        assert_eq!(plan.wait, Duration::from_millis(2000));
        assert_eq!(plan.dropped, 0);

        let plan = ticker.plan(start + Duration::from_millis(3100));
        assert_eq!(plan.wait, Duration::from_millis(2900));
        assert_eq!(plan.dropped, 0);
    }

    #[test]
    fn slightly_late_caller_fires_immediately_without_drops() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(PERIOD, start);

        let plan = ticker.plan(start + Duration::from_millis(3500));
        assert_eq!(plan, TickPlan { wait: Duration::ZERO, dropped: 0 });

        // Schedule stays on the grid: next tick at 6000.
        let plan = ticker.plan(start + Duration::from_millis(4000));
        assert_eq!(plan.wait, Duration::from_millis(2000));
    }

    #[test]
    fn overrun_drops_missed_ticks() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(PERIOD, start);

        // Ticks at 3000, 6000 and 9000 have all passed at 10000.
        let plan = ticker.plan(start + Duration::from_millis(10_000));
        assert_eq!(plan.wait, Duration::ZERO);
        assert_eq!(plan.dropped, 2);

        let plan = ticker.plan(start + Duration::from_millis(10_500));
        assert_eq!(plan.wait, Duration::from_millis(1500));
        assert_eq!(plan.dropped, 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        let ticker = Ticker::new(Duration::ZERO);
        assert_eq!(ticker.period(), MIN_PERIOD);
    }

    #[test]
    fn wait_returns_after_short_period() {
        let before = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(5));
        assert_eq!(ticker.wait(), 0);
        assert!(before.elapsed() >= Duration::from_millis(5));
    }
}
