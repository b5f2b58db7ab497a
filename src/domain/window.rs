//! Sliding click windows.
//!
//! A `RateWindow` holds the timestamps of recent clicks for one
//! (actor, kind) pair. It is pure data: no thresholds, no policy.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Error returned by a strict [`RateWindow::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// The timestamp is older than the newest entry already in the window.
    OutOfOrder {
        /// The rejected timestamp
        at: Instant,
        /// The newest timestamp currently held
        newest: Instant,
    },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::OutOfOrder { at, newest } => write!(
                f,
                "click timestamp is {:?} older than the newest recorded click",
                newest.saturating_duration_since(*at)
            ),
        }
    }
}

impl std::error::Error for WindowError {}

/// Ordered click timestamps, oldest at the front.
///
/// Entries are non-decreasing in insertion order, so pruning only ever pops
/// from the front and recording only ever pushes to the back.
///
/// # Example
/// ```
/// use click_throttle::RateWindow;
/// use std::time::{Duration, Instant};
///
/// let mut window = RateWindow::new();
/// let start = Instant::now();
///
/// window.record(start).unwrap();
/// window.record(start + Duration::from_millis(500)).unwrap();
/// assert_eq!(window.prune_and_count(start + Duration::from_millis(900), Duration::from_secs(1)), 2);
///
/// // The first click falls out of a one second window.
/// let later = start + Duration::from_millis(1200);
/// assert_eq!(window.prune_and_count(later, Duration::from_secs(1)), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RateWindow {
    clicks: VecDeque<Instant>,
}

impl RateWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a click, rejecting timestamps older than the newest entry.
    pub fn record(&mut self, at: Instant) -> Result<(), WindowError> {
        if let Some(&newest) = self.clicks.back() {
            if at < newest {
                return Err(WindowError::OutOfOrder { at, newest });
            }
        }
        self.clicks.push_back(at);
        Ok(())
    }

    /// Append a click, clamping a stale timestamp up to the newest entry.
    ///
    /// Returns the timestamp that was actually stored.
    pub fn record_monotonic(&mut self, at: Instant) -> Instant {
        let stored = match self.clicks.back() {
            Some(&newest) if at < newest => newest,
            _ => at,
        };
        self.clicks.push_back(stored);
        stored
    }

    /// Drop every click older than `window` relative to `now`, then return
    /// how many remain.
    ///
    /// A click exactly `window` old is still counted.
    pub fn prune_and_count(&mut self, now: Instant, window: Duration) -> usize {
        while let Some(&oldest) = self.clicks.front() {
            if now.saturating_duration_since(oldest) > window {
                self.clicks.pop_front();
            } else {
                break;
            }
        }
        self.clicks.len()
    }

    /// Number of clicks held, without pruning.
    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    /// Newest recorded click, if any.
    pub fn newest(&self) -> Option<Instant> {
        self.clicks.back().copied()
    }

    /// Oldest recorded click, if any.
    pub fn oldest(&self) -> Option<Instant> {
        self.clicks.front().copied()
    }
}

/// Window length for an actor: base duration plus half the round trip.
pub fn window_length(base: Duration, half_rtt: Duration) -> Duration {
    base.saturating_add(half_rtt)
}
