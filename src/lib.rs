//! Named operation timer.
//!
//! [`OperationTimer`] keeps at most one operation open at a time. Starting a
//! new operation closes the previous one; each closed span adds to the
//! duration total and invocation count kept for its name.
//! [`OperationTimer::report`] prints the totals sorted by name:
//!
//! ```text
//! "compile" duration: 1.23 count: 4
//! "load" duration: 0.10 count: 1
//! ```
pub use clock::{ManualClock, MonotonicClock};
pub use error::TimerError;
pub use guard::OperationGuard;
pub use metrics::{MeasurementSink, NoOpSink};
pub use models::{Measurement, OperationName, OperationStats, Report, ReportLine, TimerState};
pub use timer::{OperationTimer, TimerBuilder};
pub use traits::Clock;

mod clock;
mod error;
mod guard;
pub mod metrics;
mod models;
mod timer;
mod traits;
