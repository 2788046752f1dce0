//! Clock implementations.
//!
//! [`MonotonicClock`] reads `Instant::now()` and is what every timer uses
//! unless told otherwise. [`ManualClock`] only moves when asked to, which
//! makes elapsed times exact and repeatable.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Reads the system's monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only advances when [`ManualClock::advance`] is called.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the timer owns another.
///
/// ```rust
/// use std::time::Duration;
/// use optimer::{ManualClock, OperationTimer};
///
/// let clock = ManualClock::new();
/// let mut timer = OperationTimer::builder().clock(clock.clone()).build();
///
/// timer.start("load").unwrap();
/// clock.advance(Duration::from_millis(100));
/// timer.end();
///
/// assert_eq!(timer.stats("load").unwrap().duration, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    /// Total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }
}
