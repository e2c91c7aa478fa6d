use std::time::{Duration, Instant};

/// Fixed-period wall timer polled from a node's `tick`
///
/// The first poll arms the timer; it then fires once per elapsed period.
/// A timer that falls more than one period behind re-arms from `now`
/// instead of firing a burst of catch-up events.
#[derive(Debug, Clone)]
pub struct WallTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl WallTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn from_millis(period_ms: u64) -> Self {
        Self::new(Duration::from_millis(period_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm the timer so that it first fires one period after `now`
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Returns true when a period boundary has been crossed since the last fire
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            self.start(now);
            return false;
        };

        if now < due {
            return false;
        }

        let next = due + self.period;
        self.next_due = Some(if next <= now { now + self.period } else { next });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_poll_arms_without_firing() {
        let mut timer = WallTimer::from_millis(100);
        let t0 = Instant::now();
        assert!(!timer.poll(t0));
        assert!(!timer.poll(t0 + Duration::from_millis(99)));
        assert!(timer.poll(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_fires_once_per_period() {
        let mut timer = WallTimer::from_millis(100);
        let t0 = Instant::now();
        timer.start(t0);

        let fired = (1..=50)
            .filter(|i| timer.poll(t0 + Duration::from_millis(i * 10)))
            .count();
        assert_eq!(fired, 5);
    }

    #[test]
    fn test_rearms_after_stall() {
        let mut timer = WallTimer::from_millis(100);
        let t0 = Instant::now();
        timer.start(t0);

        // One long stall produces a single fire, not a burst
        let late = t0 + Duration::from_millis(1000);
        assert!(timer.poll(late));
        assert!(!timer.poll(late + Duration::from_millis(50)));
        assert!(timer.poll(late + Duration::from_millis(100)));
    }
}
