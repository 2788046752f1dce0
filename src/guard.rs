//! RAII helper around [`OperationTimer::start`] / [`OperationTimer::end`].
//!
//! The guard ends the operation when dropped, so the measurement is
//! recorded even if the measured code returns early or panics.

use std::time::Duration;

use crate::models::Measurement;
use crate::timer::OperationTimer;
use crate::traits::Clock;

/// Ends the timer's active operation when dropped.
///
/// Created by [`OperationTimer::time`]. Holds the timer mutably, so spans
/// cannot be nested while the guard is alive.
///
/// # Example
///
/// ```rust
/// use optimer::OperationTimer;
///
/// let mut timer = OperationTimer::new();
/// {
///     let _guard = timer.time("compile").unwrap();
///     // ... work being measured ...
/// } // guard is dropped here, "compile" is recorded
/// assert_eq!(timer.stats("compile").unwrap().count, 1);
/// ```
#[must_use = "the operation ends as soon as the guard is dropped"]
pub struct OperationGuard<'a, C: Clock> {
    timer: &'a mut OperationTimer<C>,
}

impl<'a, C: Clock> OperationGuard<'a, C> {
    pub(crate) fn new(timer: &'a mut OperationTimer<C>) -> Self {
        Self { timer }
    }

    /// End the operation now and return what was recorded.
    pub fn finish(self) -> Option<Measurement> {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.timer.end()
    }

    /// Time elapsed so far in the guarded operation.
    pub fn elapsed(&self) -> Option<Duration> {
        self.timer.active_elapsed()
    }
}

impl<C: Clock> Drop for OperationGuard<'_, C> {
    fn drop(&mut self) {
        self.timer.end();
    }
}
