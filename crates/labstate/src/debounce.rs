use std::time::{Duration, Instant};

pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trailing-edge debounce: fires once `quiet` has elapsed since the last touch.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Returns true exactly once per burst of touches, after the quiet period.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_PERSIST_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_last_touch() {
        let start = Instant::now();
        let mut debounce = Debouncer::default();
        debounce.touch(start);
        debounce.touch(start + Duration::from_millis(100));
        assert!(!debounce.due(start + Duration::from_millis(200)));
        assert!(debounce.due(start + Duration::from_millis(250)));
        assert!(!debounce.due(start + Duration::from_millis(400)));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn cancel_drops_pending_deadline() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(Duration::from_millis(10));
        debounce.touch(start);
        debounce.cancel();
        assert!(!debounce.due(start + Duration::from_secs(1)));
    }
}
