use std::time::{Duration, Instant};

/// Periodic revalidation schedule that pauses while the terminal is unfocused.
#[derive(Debug)]
pub struct AutoRefresh {
    interval: Duration,
    focused: bool,
    next_due: Instant,
}

impl AutoRefresh {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            focused: true,
            next_due: now + interval,
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Returns true when a refresh should fire now. A deadline that passed while
    /// unfocused fires on the first poll after focus returns.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.focused || now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }

    /// Restarts the interval, e.g. after a manual refresh.
    pub fn reset(&mut self, now: Instant) {
        self.next_due = now + self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[test]
    fn test_fires_every_interval_while_focused() {
        let t0 = Instant::now();
        let mut refresh = AutoRefresh::new(INTERVAL, t0);
        assert!(!refresh.poll(t0 + Duration::from_secs(29)));
        assert!(refresh.poll(t0 + Duration::from_secs(30)));
        assert!(!refresh.poll(t0 + Duration::from_secs(31)));
        assert!(!refresh.poll(t0 + Duration::from_secs(59)));
        assert!(refresh.poll(t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_never_fires_while_unfocused() {
        let t0 = Instant::now();
        let mut refresh = AutoRefresh::new(INTERVAL, t0);
        refresh.set_focused(false);
        for secs in [30, 60, 90, 300] {
            assert!(!refresh.poll(t0 + Duration::from_secs(secs)));
        }

        refresh.set_focused(true);
        assert!(refresh.poll(t0 + Duration::from_secs(301)));
        assert!(!refresh.poll(t0 + Duration::from_secs(302)));
    }

    #[test]
    fn test_reset_pushes_deadline() {
        let t0 = Instant::now();
        let mut refresh = AutoRefresh::new(INTERVAL, t0);
        refresh.reset(t0 + Duration::from_secs(20));
        assert!(!refresh.poll(t0 + Duration::from_secs(30)));
        assert!(refresh.poll(t0 + Duration::from_secs(50)));
    }
}
