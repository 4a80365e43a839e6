use std::time::Duration;

/// A recurring timer advanced by the host's frame delta. Holds at most one
/// active schedule; scheduling again replaces the pending one.
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    interval: Duration,
    /// Time since the last fire, or since scheduling. `None` when idle.
    since_fire: Option<Duration>,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            // A zero interval would fire forever inside one advance.
            interval: interval.max(Duration::from_millis(1)),
            since_fire: None,
        }
    }

    #[inline(always)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts a fresh schedule, dropping any progress of the previous one.
    pub fn schedule(&mut self) {
        self.since_fire = Some(Duration::ZERO);
    }

    /// Returns whether something was actually cancelled. Safe to call at any time.
    pub fn cancel(&mut self) -> bool {
        self.since_fire.take().is_some()
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.since_fire.is_some()
    }

    /// Progress towards the next fire; zero when idle.
    #[inline(always)]
    pub fn since_fire(&self) -> Duration {
        self.since_fire.unwrap_or_default()
    }

    /// Moves time forward and returns how many times the interval elapsed.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let Some(since_fire) = self.since_fire.as_mut() else { return 0; };
        *since_fire += dt;

        let mut fired = 0;
        while *since_fire >= self.interval {
            *since_fire -= self.interval;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_elapsed_interval() {
        let mut t = IntervalTimer::new(Duration::from_millis(100));
        t.schedule();
        assert_eq!(t.advance(Duration::from_millis(60)), 0);
        assert_eq!(t.advance(Duration::from_millis(60)), 1);
        assert_eq!(t.since_fire(), Duration::from_millis(20));
        assert_eq!(t.advance(Duration::from_millis(250)), 2);
    }

    #[test]
    fn idle_timer_never_fires() {
        let mut t = IntervalTimer::new(Duration::from_millis(100));
        assert_eq!(t.advance(Duration::from_secs(5)), 0);
        assert_eq!(t.since_fire(), Duration::ZERO);
    }

    #[test]
    fn rescheduling_discards_progress() {
        let mut t = IntervalTimer::new(Duration::from_millis(100));
        t.schedule();
        t.advance(Duration::from_millis(90));
        t.schedule();

        assert!(t.is_active());
        assert_eq!(t.advance(Duration::from_millis(20)), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut t = IntervalTimer::new(Duration::from_millis(100));
        assert!(!t.cancel());
        t.schedule();
        assert!(t.cancel());
        assert!(!t.cancel());
        assert!(!t.is_active());
    }
}
