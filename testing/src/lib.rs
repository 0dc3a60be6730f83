//! Test utilities shared by the simulation crates.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::cell::RefCell;
use std::rc::Rc;

use devsim::{AtomicModel, ModelError};

pub mod logger;

/// A transition invoked on a [`RecordingModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Output function called.
    Output(f64),
    /// Internal transition at the given time.
    Internal(f64),
    /// External transition with the received bag.
    External(f64, Vec<String>),
    /// Confluent transition with the received bag.
    Confluent(f64, Vec<String>),
}

/// Calls shared between a [`RecordingModel`] and the test observing it.
pub type CallLog = Rc<RefCell<Vec<(&'static str, Call)>>>;

/// A model that follows a fixed schedule of internal events and records every call.
///
/// Like any model, it stays passive until its first input, so the schedule only starts to
/// matter once something is delivered to it.
///
/// The output function is recorded with the time of the model's pending internal event, since
/// that is the only time at which it can be invoked.
pub struct RecordingModel {
    name: &'static str,
    schedule: Vec<f64>,
    output: Option<String>,
    log: CallLog,
}

impl RecordingModel {
    /// Constructs a model that schedules internal events at `schedule`, in that order, and
    /// emits `output` on each of them.
    #[must_use]
    pub fn new(name: &'static str, schedule: &[f64], output: Option<&str>, log: &CallLog) -> Self {
        Self {
            name,
            schedule: schedule.iter().rev().copied().collect(),
            output: output.map(String::from),
            log: Rc::clone(log),
        }
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push((self.name, call));
    }
}

impl AtomicModel<String> for RecordingModel {
    fn output(&self) -> Option<String> {
        self.record(Call::Output(self.next_internal_event_time()));
        self.output.clone()
    }

    fn internal_transition(&mut self, time: f64) -> Result<(), ModelError> {
        self.record(Call::Internal(time));
        self.schedule.pop();
        Ok(())
    }

    fn external_transition(&mut self, inputs: &[String], time: f64) -> Result<(), ModelError> {
        self.record(Call::External(time, inputs.to_vec()));
        Ok(())
    }

    fn confluent_transition(&mut self, inputs: &[String], time: f64) -> Result<(), ModelError> {
        self.record(Call::Confluent(time, inputs.to_vec()));
        self.schedule.pop();
        Ok(())
    }

    fn next_internal_event_time(&self) -> f64 {
        self.schedule.last().copied().unwrap_or(f64::INFINITY)
    }
}

/// Returns a new, empty call log.
#[must_use]
pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}
