//! Pluggable observer for completed measurements.
//!
//! Every time a span closes, whether through [`OperationTimer::end`], the
//! implicit flush in [`OperationTimer::start`] or an
//! [`OperationGuard`](crate::OperationGuard) going out of scope, the timer
//! hands a [`Measurement`] to its sink. The sink is configured per timer via
//! [`TimerBuilder::sink`]; there is no process-wide sink.
//!
//! ## Usage
//!
//! ```rust
//! use optimer::{Measurement, MeasurementSink, OperationTimer};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Counter(AtomicU64);
//!
//! impl MeasurementSink for Counter {
//!     fn on_measurement(&self, _m: &Measurement) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let counter = Arc::new(Counter::default());
//! let mut timer = OperationTimer::builder().sink(counter.clone()).build();
//! timer.start("a").unwrap();
//! timer.start("b").unwrap();
//! timer.end();
//! assert_eq!(counter.0.load(Ordering::Relaxed), 2);
//! ```
//!
//! [`OperationTimer::end`]: crate::OperationTimer::end
//! [`OperationTimer::start`]: crate::OperationTimer::start
//! [`TimerBuilder::sink`]: crate::TimerBuilder::sink

use crate::models::Measurement;

/// Trait for consuming completed measurements.
///
/// Called synchronously from inside the timer, so implementations should
/// return quickly. The `Send + Sync` bounds let one sink be shared by timers
/// living on different threads.
pub trait MeasurementSink: Send + Sync {
    /// Called once per closed span.
    fn on_measurement(&self, measurement: &Measurement);

    /// Called when the owning timer is reset. Default does nothing.
    fn on_reset(&self) {}
}

/// Sink that drops everything. Used when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl MeasurementSink for NoOpSink {
    fn on_measurement(&self, _measurement: &Measurement) {}
}
