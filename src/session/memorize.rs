use std::time::{Duration, Instant};

pub const DEFAULT_MEMORIZATION_SECS: u64 = 60;

/// Countdown shown while the player studies the working set.
pub struct MemorizeState {
    started_at: Instant,
    duration: Duration,
    fired: bool,
}

impl MemorizeState {
    pub fn new(now: Instant, secs: u64) -> Self {
        Self {
            started_at: now,
            duration: Duration::from_secs(secs),
            fired: false,
        }
    }

    /// Whole seconds left, counting down one per elapsed second.
    pub fn time_left(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        self.duration.as_secs().saturating_sub(elapsed)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.time_left(now) == 0
    }

    /// Start the quiz when the countdown runs out or the player asks. Fires at
    /// most once.
    pub fn take_start(&mut self, now: Instant, manual: bool) -> bool {
        if self.fired || !(manual || self.is_due(now)) {
            return false;
        }
        self.fired = true;
        true
    }
}

pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown() {
        let t0 = Instant::now();
        let m = MemorizeState::new(t0, 60);
        assert_eq!(m.time_left(t0), 60);
        assert_eq!(m.time_left(t0 + Duration::from_millis(1500)), 59);
        assert_eq!(m.time_left(t0 + Duration::from_secs(90)), 0);
        assert!(m.is_due(t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_start_fires_once() {
        let t0 = Instant::now();
        let mut m = MemorizeState::new(t0, 10);
        assert!(!m.take_start(t0, false));
        assert!(m.take_start(t0, true));
        assert!(!m.take_start(t0 + Duration::from_secs(20), false));
        assert!(!m.take_start(t0, true));
    }

    #[test]
    fn test_start_on_expiry() {
        let t0 = Instant::now();
        let mut m = MemorizeState::new(t0, 10);
        assert!(m.take_start(t0 + Duration::from_secs(10), false));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(60), "1:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(125), "2:05");
    }
}
