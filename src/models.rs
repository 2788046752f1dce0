use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::error::TimerError;

/// Name of a timed operation, e.g. `compile` or `load`.
///
/// Any non-empty string is accepted. The empty string does not identify
/// anything and is rejected with [`TimerError::InvalidOperationName`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationName(String);

impl OperationName {
    pub fn new(name: impl Into<String>) -> Result<Self, TimerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TimerError::InvalidOperationName(
                "operation name must not be empty".to_string(),
            ));
        }
        Ok(OperationName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OperationName {
    type Error = TimerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OperationName::new(value)
    }
}

impl TryFrom<&str> for OperationName {
    type Error = TimerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        OperationName::new(value)
    }
}

impl From<OperationName> for String {
    fn from(value: OperationName) -> Self {
        value.0
    }
}

impl AsRef<str> for OperationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for OperationName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Running totals for one operation name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    /// Sum of all completed measurements
    pub duration: Duration,
    /// Number of completed measurements
    pub count: u64,
}

impl OperationStats {
    pub(crate) fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.duration += elapsed;
    }

    /// Mean duration per invocation, `None` if nothing was recorded.
    pub fn mean(&self) -> Option<Duration> {
        let count = u32::try_from(self.count).ok()?;
        if count == 0 {
            return None;
        }
        Some(self.duration / count)
    }
}

/// One closed span, handed to the configured
/// [`MeasurementSink`](crate::MeasurementSink) when it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub name: OperationName,
    pub duration: Duration,
}

/// Whether a timer currently has an open span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Active,
}

/// One line of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub name: OperationName,
    /// Accumulated duration in seconds
    pub duration_secs: f64,
    pub count: u64,
}

impl Display for ReportLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "\"{}\" duration: {:.2} count: {}",
            self.name, self.duration_secs, self.count
        )
    }
}

/// Snapshot of every operation that has completed at least once, sorted
/// ascending by name.
///
/// Its `Display` form is exactly what
/// [`OperationTimer::report`](crate::OperationTimer::report) prints: one
/// newline-terminated line per operation, no header or trailer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub operations: Vec<ReportLine>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportLine> {
        self.operations.iter()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for line in &self.operations {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
