use std::time::Instant;

/// Source of "now" for an [`OperationTimer`](crate::OperationTimer).
///
/// The default is [`MonotonicClock`](crate::MonotonicClock). Swap in a
/// [`ManualClock`](crate::ManualClock) to drive elapsed time by hand.
pub trait Clock {
    /// The current instant. Successive calls must never go backwards.
    fn now(&self) -> Instant;
}
