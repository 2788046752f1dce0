use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::clock::MonotonicClock;
use crate::error::TimerError;
use crate::guard::OperationGuard;
use crate::metrics::{MeasurementSink, NoOpSink};
use crate::models::{
    Measurement, OperationName, OperationStats, Report, ReportLine, TimerState,
};
use crate::traits::Clock;

/// Tracks one active named operation at a time and accumulates duration and
/// invocation count per name.
///
/// ```rust
/// use optimer::OperationTimer;
///
/// let mut timer = OperationTimer::new();
/// timer.start("load").unwrap();
/// // ... work ...
/// timer.start("compute").unwrap(); // closes "load"
/// // ... work ...
/// timer.end();
/// timer.report().unwrap();
/// ```
pub struct OperationTimer<C: Clock = MonotonicClock> {
    stats: HashMap<OperationName, OperationStats>,
    active: Option<(OperationName, Instant)>,
    clock: C,
    sink: Arc<dyn MeasurementSink>,
}

impl OperationTimer<MonotonicClock> {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TimerBuilder<MonotonicClock> {
        TimerBuilder::new()
    }
}

impl Default for OperationTimer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> OperationTimer<C> {
    /// Discard all statistics and any open span.
    ///
    /// An open span is dropped without being recorded. The clock and sink
    /// are kept.
    pub fn reset(&mut self) {
        debug!(
            event = "Timer",
            phase = "Reset",
            operations = self.stats.len(),
            discarded = self.active.as_ref().map(|(name, _)| name.as_str())
        );
        self.stats.clear();
        self.active = None;
        self.sink.on_reset();
    }

    /// Open a span for `name`, closing the current one first if there is one.
    ///
    /// Fails only if `name` is empty, in which case nothing changes and any
    /// open span stays open.
    pub fn start(&mut self, name: impl Into<String>) -> Result<(), TimerError> {
        let name = OperationName::new(name).inspect_err(|e| {
            warn!(event = "Operation", phase = "Start", error = %e);
        })?;

        if let Some((previous, _)) = &self.active {
            debug!(
                event = "Operation",
                phase = "Flush",
                operation = previous.as_str(),
                next = name.as_str()
            );
            self.end();
        }

        debug!(event = "Operation", phase = "Start", operation = name.as_str());
        self.active = Some((name, self.clock.now()));
        Ok(())
    }

    /// Close the open span and fold it into the statistics for its name.
    ///
    /// Returns the closed measurement, or `None` if no span was open.
    pub fn end(&mut self) -> Option<Measurement> {
        let Some((name, started)) = self.active.take() else {
            trace!(event = "Operation", phase = "End", "no active operation");
            return None;
        };

        let elapsed = self.clock.now().saturating_duration_since(started);
        let stats = self.stats.entry(name.clone()).or_default();
        stats.record(elapsed);

        debug!(
            event = "Operation",
            phase = "End",
            operation = name.as_str(),
            elapsed_secs = elapsed.as_secs_f64(),
            count = stats.count
        );

        let measurement = Measurement {
            name,
            duration: elapsed,
        };
        self.sink.on_measurement(&measurement);
        Some(measurement)
    }

    /// Start `name` and return a guard that ends it when dropped.
    pub fn time(
        &mut self,
        name: impl Into<String>,
    ) -> Result<OperationGuard<'_, C>, TimerError> {
        self.start(name)?;
        Ok(OperationGuard::new(self))
    }

    /// Print the summary to standard output, one line per operation,
    /// sorted by name.
    pub fn report(&self) -> Result<(), TimerError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.write_report(&mut out)
    }

    /// Write the same lines [`report`](Self::report) prints to `out`.
    pub fn write_report<W: Write>(&self, out: &mut W) -> Result<(), TimerError> {
        for line in self.summary().iter() {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Sorted snapshot of every operation ended at least once.
    pub fn summary(&self) -> Report {
        let operations = self
            .stats
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(name, stats)| ReportLine {
                name: name.clone(),
                duration_secs: stats.duration.as_secs_f64(),
                count: stats.count,
            })
            .collect();
        Report { operations }
    }

    pub fn stats(&self, name: &str) -> Option<OperationStats> {
        self.stats.get(name).copied()
    }

    /// Names of all recorded operations, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &OperationName> {
        self.stats.keys().sorted()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn state(&self) -> TimerState {
        match self.active {
            Some(_) => TimerState::Active,
            None => TimerState::Idle,
        }
    }

    pub fn active_operation(&self) -> Option<&OperationName> {
        self.active.as_ref().map(|(name, _)| name)
    }

    /// Time elapsed so far in the open span.
    pub fn active_elapsed(&self) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|(_, started)| self.clock.now().saturating_duration_since(*started))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock + Debug> Debug for OperationTimer<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationTimer")
            .field("stats", &self.stats)
            .field("active", &self.active)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`OperationTimer`] with a non-default clock or sink.
///
/// ```rust
/// use optimer::{ManualClock, NoOpSink, OperationTimer};
/// use std::sync::Arc;
///
/// let timer = OperationTimer::builder()
///     .clock(ManualClock::new())
///     .sink(Arc::new(NoOpSink))
///     .build();
/// assert!(timer.is_empty());
/// ```
pub struct TimerBuilder<C: Clock = MonotonicClock> {
    clock: C,
    sink: Option<Arc<dyn MeasurementSink>>,
}

impl TimerBuilder<MonotonicClock> {
    pub fn new() -> Self {
        Self {
            clock: MonotonicClock,
            sink: None,
        }
    }
}

impl Default for TimerBuilder<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TimerBuilder<C> {
    pub fn clock<D: Clock>(self, clock: D) -> TimerBuilder<D> {
        TimerBuilder {
            clock,
            sink: self.sink,
        }
    }

    pub fn sink(mut self, sink: Arc<dyn MeasurementSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> OperationTimer<C> {
        OperationTimer {
            stats: HashMap::new(),
            active: None,
            clock: self.clock,
            sink: self.sink.unwrap_or_else(|| Arc::new(NoOpSink)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use insta::{assert_json_snapshot, assert_snapshot};
    use std::sync::Mutex;
    use yare::parameterized;

    fn manual_timer() -> (OperationTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let timer = OperationTimer::builder().clock(clock.clone()).build();
        (timer, clock)
    }

    fn rendered(timer: &OperationTimer<ManualClock>) -> String {
        let mut out = Vec::new();
        timer.write_report(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        measurements: Mutex<Vec<Measurement>>,
        resets: Mutex<usize>,
    }

    impl MeasurementSink for RecordingSink {
        fn on_measurement(&self, measurement: &Measurement) {
            self.measurements.lock().unwrap().push(measurement.clone());
        }

        fn on_reset(&self) {
            *self.resets.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_new_timer_is_idle_and_empty() {
        let timer = OperationTimer::new();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.active_operation().is_none());
        assert!(timer.is_empty());
        assert!(timer.summary().is_empty());
    }

    #[test]
    fn test_load_then_compute_report() {
        let (mut timer, clock) = manual_timer();

        timer.start("load").unwrap();
        clock.advance(Duration::from_millis(100));
        timer.end();
        timer.start("compute").unwrap();
        clock.advance(Duration::from_millis(200));
        timer.end();

        assert_eq!(
            rendered(&timer),
            "\"compute\" duration: 0.20 count: 1\n\"load\" duration: 0.10 count: 1\n"
        );
        assert_snapshot!("load_then_compute_report", rendered(&timer));
    }

    #[test]
    fn test_summary_json() {
        let (mut timer, clock) = manual_timer();
        for (name, millis) in [("parse", 250), ("emit", 500), ("parse", 250)] {
            timer.start(name).unwrap();
            clock.advance(Duration::from_millis(millis));
        }
        timer.end();

        assert_json_snapshot!("summary_json", timer.summary());
    }

    #[test]
    fn test_repeated_start_closes_previous() {
        let (mut timer, clock) = manual_timer();
        for _ in 0..3 {
            timer.start("x").unwrap();
            clock.advance(Duration::from_millis(50));
        }
        timer.end();

        let stats = timer.stats("x").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.duration, Duration::from_millis(150));
    }

    #[test]
    fn test_end_returns_measurement() {
        let (mut timer, clock) = manual_timer();
        assert_eq!(timer.end(), None);

        timer.start("load").unwrap();
        clock.advance(Duration::from_millis(30));
        let measurement = timer.end().unwrap();
        assert_eq!(measurement.name.as_str(), "load");
        assert_eq!(measurement.duration, Duration::from_millis(30));
        assert_eq!(timer.end(), None);
    }

    #[test]
    fn test_zero_elapsed_is_recorded() {
        let (mut timer, _clock) = manual_timer();
        timer.start("instant").unwrap();
        timer.end();
        assert_eq!(
            timer.stats("instant"),
            Some(OperationStats {
                duration: Duration::ZERO,
                count: 1
            })
        );
        assert_eq!(rendered(&timer), "\"instant\" duration: 0.00 count: 1\n");
    }

    #[test]
    fn test_open_span_is_not_reported() {
        let (mut timer, clock) = manual_timer();
        timer.start("pending").unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(timer.state(), TimerState::Active);
        assert_eq!(timer.active_operation().unwrap().as_str(), "pending");
        assert_eq!(rendered(&timer), "");
    }

    #[test]
    fn test_empty_name_is_rejected_without_flushing() {
        let (mut timer, clock) = manual_timer();
        timer.start("load").unwrap();
        clock.advance(Duration::from_millis(10));

        let err = timer.start("").unwrap_err();
        assert!(matches!(err, TimerError::InvalidOperationName(_)));
        assert_eq!(timer.active_operation().unwrap().as_str(), "load");
        assert!(timer.is_empty());

        clock.advance(Duration::from_millis(10));
        timer.end();
        assert_eq!(
            timer.stats("load").unwrap().duration,
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_reset_discards_open_span_and_keeps_clock() {
        let (mut timer, clock) = manual_timer();
        timer.start("a").unwrap();
        clock.advance(Duration::from_millis(10));
        timer.end();
        timer.start("b").unwrap();

        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.is_empty());
        assert_eq!(timer.end(), None);

        timer.start("c").unwrap();
        clock.advance(Duration::from_millis(40));
        timer.end();
        assert_eq!(timer.clock().elapsed(), Duration::from_millis(50));
        assert_eq!(rendered(&timer), "\"c\" duration: 0.04 count: 1\n");
    }

    #[test]
    fn test_sink_receives_every_closed_span() {
        let clock = ManualClock::new();
        let sink = Arc::new(RecordingSink::default());
        let mut timer = OperationTimer::builder()
            .clock(clock.clone())
            .sink(sink.clone())
            .build();

        timer.start("a").unwrap();
        clock.advance(Duration::from_millis(5));
        timer.start("b").unwrap();
        clock.advance(Duration::from_millis(7));
        timer.end();
        timer.end();
        timer.start("dropped").unwrap();
        timer.reset();

        let seen = sink.measurements.lock().unwrap();
        let names: Vec<&str> = seen.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(seen[1].duration, Duration::from_millis(7));
        assert_eq!(*sink.resets.lock().unwrap(), 1);
    }

    #[parameterized(
        already_sorted = { &["alpha", "mu", "zeta"] },
        reversed = { &["zeta", "mu", "alpha"] },
        interleaved = { &["zeta", "alpha", "mu"] },
        with_repeats = { &["mu", "zeta", "alpha", "mu", "zeta"] },
    )]
    fn test_operations_are_sorted(order: &[&str]) {
        let (mut timer, _clock) = manual_timer();
        for name in order {
            timer.start(*name).unwrap();
        }
        timer.end();

        let names: Vec<&str> = timer.operations().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mu", "zeta"]);
        let reported: Vec<String> = timer
            .summary()
            .iter()
            .map(|l| l.name.to_string())
            .collect();
        assert_eq!(reported, names);
    }

    #[test]
    fn test_sort_is_bytewise_not_case_insensitive() {
        let (mut timer, _clock) = manual_timer();
        for name in ["beta", "Alpha", "alpha"] {
            timer.start(name).unwrap();
        }
        timer.end();
        let names: Vec<&str> = timer.operations().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_report_to_stdout() {
        let mut timer = OperationTimer::new();
        timer.start("stdout").unwrap();
        timer.end();
        assert!(timer.report().is_ok());
    }

    #[test]
    fn test_real_clock_accumulates() {
        let mut timer = OperationTimer::new();
        for _ in 0..2 {
            timer.start("sleep").unwrap();
            std::thread::sleep(Duration::from_millis(5));
            timer.end();
        }
        let stats = timer.stats("sleep").unwrap();
        assert_eq!(stats.count, 2);
        assert!(stats.duration >= Duration::from_millis(10));
    }

    #[test]
    fn test_debug_output() {
        let (timer, _clock) = manual_timer();
        let debug_str = format!("{:?}", timer);
        assert!(debug_str.contains("OperationTimer"));
        assert!(debug_str.contains("active: None"));
    }
}
