//! Rebuild debouncing.
//!
//! A single-slot timer: any trigger while pending pushes the deadline back,
//! and the slot fires once the deadline passes without further triggers.

use std::time::Duration;

use tokio::time::Instant;

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Pending { deadline: Instant },
}

/// Collapses bursts of triggers into a single firing.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: State,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
        }
    }

    /// Record a trigger at `now`, (re)starting the window.
    pub fn trigger(&mut self, now: Instant) {
        self.state = State::Pending {
            deadline: now + self.window,
        };
    }

    /// Deadline of the pending firing, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::Pending { deadline } => Some(deadline),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state != State::Idle
    }

    /// Fire if the deadline has passed at `now`.
    ///
    /// Returns `true` exactly once per collapsed burst and moves back to idle.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            State::Pending { deadline } if now >= deadline => {
                self.state = State::Idle;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn test_idle_never_fires() {
        let mut debouncer = Debouncer::new(WINDOW);
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.deadline(), None);
        assert!(!debouncer.fire(Instant::now() + Duration::from_secs(10)));
    }

    #[test]
    fn test_fires_once_after_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.trigger(start);

        assert_eq!(debouncer.deadline(), Some(start + WINDOW));
        assert!(!debouncer.fire(start + Duration::from_millis(50)));
        assert!(debouncer.fire(start + WINDOW));
        assert!(!debouncer.fire(start + WINDOW * 2));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_collapses_and_extends_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        for offset in [0, 30, 60, 90] {
            debouncer.trigger(start + Duration::from_millis(offset));
        }

        // The first trigger's deadline has passed, the last one's has not
        assert!(!debouncer.fire(start + Duration::from_millis(120)));
        assert!(debouncer.fire(start + Duration::from_millis(190)));
        assert!(!debouncer.fire(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_default_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.trigger(start);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(DEFAULT_DEBOUNCE_MS))
        );
    }
}
