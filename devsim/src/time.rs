use std::fmt;

use ordered_float::NotNan;

use crate::SimulationError;

/// Real-valued instant of simulation time. NaN is not a valid instant.
pub type RealTime = NotNan<f64>;

/// Converts a raw instant into a [`RealTime`].
///
/// # Errors
///
/// Returns [`SimulationError::InvalidTime`] if `r` is NaN.
pub fn real_time(r: f64) -> Result<RealTime, SimulationError> {
    NotNan::new(r).map_err(|_| SimulationError::InvalidTime(r))
}

/// A point in simulation time: a real instant and a tie-break counter that orders events
/// sharing that instant.
///
/// Ordering is lexicographic: first by the real instant, then by the counter.
/// Equality is exact in both fields, with no tolerance. Instants that differ by any amount
/// are distinct, so all simulation times must come from an exact, deterministic source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    real: RealTime,
    counter: u32,
}

impl Time {
    /// Constructs the time at instant `real` with the tie-break `counter`.
    #[must_use]
    pub fn new(real: RealTime, counter: u32) -> Self {
        Self { real, counter }
    }

    /// The real instant.
    #[must_use]
    pub fn real(&self) -> RealTime {
        self.real
    }

    /// The tie-break counter.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Returns `true` if both times fall on the same real instant, regardless of counters.
    #[must_use]
    pub fn is_simultaneous(&self, other: &Self) -> bool {
        self.real == other.real
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.real, self.counter)
    }
}
