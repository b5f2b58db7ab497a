//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Controllable clock for deterministic window and expiry tests.
///
/// Clones share the same time, so a clone handed to a throttle can be
/// advanced from the test body.
///
/// # Examples
///
/// ```
/// use click_throttle::infrastructure::mocks::MockClock;
/// use click_throttle::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// let shared = clock.clone();
///
/// shared.advance(Duration::from_millis(250));
/// assert_eq!(clock.now(), start + Duration::from_millis(250));
/// assert_eq!(clock.elapsed(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    current_time: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        *self.lock() += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.lock() = instant;
    }

    /// The instant the clock was created at.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Time advanced since `start`.
    pub fn elapsed(&self) -> Duration {
        self.lock().saturating_duration_since(self.start)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.current_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let start = Instant::now();
        let clock = MockClock::new(start);

        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.now(), start + Duration::from_secs(10));

        let new_time = start + Duration::from_secs(100);
        clock.set(new_time);
        assert_eq!(clock.now(), new_time);
        assert_eq!(clock.elapsed(), Duration::from_secs(100));
    }

    #[test]
    fn test_set_before_start_saturates_elapsed() {
        let start = Instant::now() + Duration::from_secs(10);
        let clock = MockClock::new(start);
        clock.set(start - Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
