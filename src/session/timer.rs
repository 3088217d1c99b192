use std::time::{Duration, Instant};

/// A one-shot, cancellable deadline polled from the event loop.
#[derive(Clone, Debug, Default)]
pub struct DeferredTransition {
    deadline: Option<Instant>,
}

impl DeferredTransition {
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// True exactly once per arming, at the first poll at or after the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = DeferredTransition::default();
        timer.arm(t0, Duration::from_millis(100));
        assert!(timer.is_armed());
        assert!(!timer.fire_if_due(t0 + Duration::from_millis(99)));
        assert!(timer.fire_if_due(t0 + Duration::from_millis(100)));
        assert!(!timer.fire_if_due(t0 + Duration::from_millis(500)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let t0 = Instant::now();
        let mut timer = DeferredTransition::default();
        timer.arm(t0, Duration::from_millis(10));
        timer.cancel();
        assert!(!timer.fire_if_due(t0 + Duration::from_secs(5)));
        assert_eq!(timer.remaining(t0), None);
    }

    #[test]
    fn test_remaining_saturates() {
        let t0 = Instant::now();
        let mut timer = DeferredTransition::default();
        timer.arm(t0, Duration::from_millis(300));
        assert_eq!(
            timer.remaining(t0 + Duration::from_millis(100)),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            timer.remaining(t0 + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
