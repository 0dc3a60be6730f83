use std::fmt;

use delegate::delegate;
use itertools::Itertools;
use serde::Serialize;

/// A payload that reached the system output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord<P> {
    /// Simulation time at which the payload was emitted.
    pub time: f64,
    /// The emitted payload.
    pub payload: P,
}

impl<P: fmt::Display> fmt::Display for TraceRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.time, self.payload)
    }
}

/// Output of a simulation run: every payload emitted by the exit point, in emission order.
/// Times are non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace<P> {
    records: Vec<TraceRecord<P>>,
}

impl<P> Default for Trace<P> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<P> Trace<P> {
    pub(crate) fn push(&mut self, time: f64, payload: P) {
        debug_assert!(self.records.last().map_or(true, |last| last.time <= time));
        self.records.push(TraceRecord { time, payload });
    }

    delegate! {
        to self.records {
            /// Number of records.
            #[must_use]
            pub fn len(&self) -> usize;
            /// Returns `true` if nothing reached the system output.
            #[must_use]
            pub fn is_empty(&self) -> bool;
        }
    }

    /// Iterates over the records in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord<P>> {
        self.records.iter()
    }

    /// Takes the records out of the trace.
    #[must_use]
    pub fn into_records(self) -> Vec<TraceRecord<P>> {
        self.records
    }
}

impl<P> IntoIterator for Trace<P> {
    type Item = TraceRecord<P>;
    type IntoIter = std::vec::IntoIter<TraceRecord<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, P> IntoIterator for &'a Trace<P> {
    type Item = &'a TraceRecord<P>;
    type IntoIter = std::slice::Iter<'a, TraceRecord<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One `"{time} - {payload}"` line per record.
impl<P: fmt::Display> fmt::Display for Trace<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.records.iter().join("\n"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn trace() -> Trace<String> {
        let mut trace = Trace::default();
        trace.push(4.5, String::from("1 part completed"));
        trace.push(6.5, String::from("1 part completed"));
        trace.push(6.5, String::from("1"));
        trace
    }

    #[test]
    fn test_accessors() {
        let trace = trace();
        assert_eq!(trace.len(), 3);
        assert!(!trace.is_empty());
        assert_eq!(
            trace.iter().map(|r| r.time).collect::<Vec<_>>(),
            vec![4.5, 6.5, 6.5]
        );
        assert!(Trace::<String>::default().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            trace().to_string(),
            "4.5 - 1 part completed\n6.5 - 1 part completed\n6.5 - 1"
        );
        let mut whole = Trace::default();
        whole.push(3.0, "x");
        assert_eq!(whole.to_string(), "3 - x");
    }

    #[test]
    fn test_serialize() {
        assert_eq!(
            serde_json::to_string(&trace().into_records()[..1]).unwrap(),
            r#"[{"time":4.5,"payload":"1 part completed"}]"#
        );
        let mut trace = Trace::default();
        trace.push(1.0, 7);
        assert_eq!(
            serde_json::to_string(&trace).unwrap(),
            r#"[{"time":1.0,"payload":7}]"#
        );
    }
}
