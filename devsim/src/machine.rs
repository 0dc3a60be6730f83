use crate::{AtomicModel, ModelError};

/// A processing machine with an unbounded input buffer.
///
/// Every input payload is a number of parts added to the buffer. While parts are waiting,
/// the machine finishes one part per cycle and emits its output label for each finished part.
/// A machine that receives parts while idle starts a new cycle at the time of arrival;
/// parts arriving while it is busy do not affect the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    cycle: f64,
    label: String,
    parts: u64,
    next_event: f64,
}

impl Machine {
    /// Constructs an idle machine finishing a part every `cycle` time units and emitting
    /// `label` for each of them.
    #[must_use]
    pub fn new<S: Into<String>>(cycle: f64, label: S) -> Self {
        Self {
            cycle,
            label: label.into(),
            parts: 0,
            next_event: f64::INFINITY,
        }
    }

    /// A press: one part per time unit, emitting `"1"` to pass the part on.
    #[must_use]
    pub fn press() -> Self {
        Self::new(1.0, "1")
    }

    /// A drill: one part every two time units, reporting `"1 part completed"`.
    #[must_use]
    pub fn drill() -> Self {
        Self::new(2.0, "1 part completed")
    }

    /// Number of parts currently in the machine, including the one being processed.
    #[must_use]
    pub fn parts(&self) -> u64 {
        self.parts
    }

    fn parse_count(payload: &str) -> Result<u64, ModelError> {
        payload
            .trim()
            .parse()
            .map_err(|err| ModelError::MalformedPayload {
                payload: payload.to_string(),
                source: Box::new(err),
            })
    }

    fn finish_part(&mut self, time: f64) {
        self.parts = self.parts.saturating_sub(1);
        self.next_event = if self.parts > 0 {
            time + self.cycle
        } else {
            f64::INFINITY
        };
    }

    fn receive(&mut self, inputs: &[String], time: f64) -> Result<(), ModelError> {
        let mut parts = self.parts;
        for payload in inputs {
            parts = parts
                .checked_add(Self::parse_count(payload)?)
                .ok_or_else(|| ModelError::MalformedPayload {
                    payload: payload.clone(),
                    source: format!("machine cannot hold more than {} parts", u64::MAX).into(),
                })?;
        }
        let was_idle = self.parts == 0;
        self.parts = parts;
        if self.parts == 0 {
            self.next_event = f64::INFINITY;
        } else if was_idle {
            self.next_event = time + self.cycle;
        }
        Ok(())
    }
}

impl AtomicModel<String> for Machine {
    fn output(&self) -> Option<String> {
        Some(self.label.clone())
    }

    fn internal_transition(&mut self, time: f64) -> Result<(), ModelError> {
        self.finish_part(time);
        Ok(())
    }

    fn external_transition(&mut self, inputs: &[String], time: f64) -> Result<(), ModelError> {
        self.receive(inputs, time)
    }

    /// Finishes the current part first, then takes in the new ones.
    fn confluent_transition(&mut self, inputs: &[String], time: f64) -> Result<(), ModelError> {
        self.finish_part(time);
        self.receive(inputs, time)
    }

    fn next_internal_event_time(&self) -> f64 {
        self.next_event
    }
}
