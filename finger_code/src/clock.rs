//! Session time sources for the dispatch gate.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time since the start of a session.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock session time backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn start() -> Self { SessionClock { start: Instant::now() } }
}

impl Default for SessionClock {
    fn default() -> Self { SessionClock::start() }
}

impl Clock for SessionClock {
    fn now(&self) -> Duration { self.start.elapsed() }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self { ManualClock::default() }

    pub fn set(&self, now: Duration) { self.now.set(now); }

    pub fn advance(&self, by: Duration) { self.now.set(self.now.get() + by); }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration { self.now.get() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let c = ManualClock::new();
        assert_eq!(c.now(), Duration::ZERO);
        c.advance(Duration::from_millis(300));
        c.advance(Duration::from_millis(300));
        assert_eq!(c.now(), Duration::from_millis(600));
        c.set(Duration::from_secs(2));
        assert_eq!(c.now(), Duration::from_secs(2));
    }

    #[test]
    fn session_clock_is_monotonic() {
        let c = SessionClock::start();
        let a = c.now();
        let b = c.now();
        assert!(b >= a);
    }
}
