use std::collections::BTreeMap;
use std::fmt;

use crate::{
    real_time, AtomicModel, CouplingTable, Destination, Event, EventQueue, ModelId, RealTime,
    SimulationError, Trace,
};

/// State of a simulation run.
///
/// The configuration phase preceding a run is represented by [`SimulatorBuilder`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    /// Events are pending.
    Running,
    /// The event queue has been exhausted. Terminal.
    Halted,
}

/// Collects models, couplings, and exogenous inputs of a simulation.
///
/// Nothing is validated until [`build`](Self::build), which starts the run. A running
/// [`Simulator`] cannot be reconfigured.
pub struct SimulatorBuilder<P> {
    models: Vec<Box<dyn AtomicModel<P>>>,
    entries: Vec<ModelId>,
    routes: Vec<(ModelId, Destination)>,
    inputs: Vec<(f64, P)>,
}

impl<P> Default for SimulatorBuilder<P> {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            entries: Vec::new(),
            routes: Vec::new(),
            inputs: Vec::new(),
        }
    }
}

impl<P: fmt::Debug> SimulatorBuilder<P> {
    /// Registers a model and returns its ID.
    pub fn add_model<M>(&mut self, model: M) -> ModelId
    where
        M: AtomicModel<P> + 'static,
    {
        self.add_boxed_model(Box::new(model))
    }

    /// Registers an already boxed model and returns its ID.
    pub fn add_boxed_model(&mut self, model: Box<dyn AtomicModel<P>>) -> ModelId {
        let id = ModelId::from(self.models.len());
        self.models.push(model);
        id
    }

    /// Routes the output of `source` to `destination`.
    pub fn add_coupling(&mut self, source: ModelId, destination: ModelId) -> &mut Self {
        self.routes.push((source, Destination::Model(destination)));
        self
    }

    /// Designates `model` as the network's entry point, receiving all exogenous inputs.
    pub fn route_input_to(&mut self, model: ModelId) -> &mut Self {
        self.entries.push(model);
        self
    }

    /// Designates `model` as the network's exit point, whose output makes up the trace.
    pub fn take_output_from(&mut self, model: ModelId) -> &mut Self {
        self.routes.push((model, Destination::SystemOutput));
        self
    }

    /// Schedules an exogenous `payload` for the entry point at absolute `time`.
    /// A later input at exactly the same time replaces an earlier one.
    pub fn add_input(&mut self, time: f64, payload: P) -> &mut Self {
        self.inputs.push((time, payload));
        self
    }

    /// Validates the configuration and starts a run.
    ///
    /// The fresh event queue is seeded with one external event per exogenous input. Models are
    /// first asked for their next internal event after their first transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry or the exit point is not set, a coupling refers to an
    /// unknown model, a model is coupled twice, or an input time is NaN.
    pub fn build(self) -> Result<Simulator<P>, SimulationError> {
        let couplings = CouplingTable::new(self.models.len(), &self.entries, &self.routes)?;
        let mut schedule: BTreeMap<RealTime, P> = BTreeMap::new();
        for (time, payload) in self.inputs {
            if let Some(previous) = schedule.insert(real_time(time)?, payload) {
                log::warn!("Input {:?} at time {} has been overwritten", previous, time);
            }
        }
        let mut queue = EventQueue::new();
        let entry = couplings.entry_point();
        for (r, payload) in schedule {
            queue.schedule_external(payload, r, entry);
        }
        let mut simulator = Simulator {
            outputs: self.models.iter().map(|_| None).collect(),
            models: self.models,
            couplings,
            queue,
            trace: Trace::default(),
            status: Status::Running,
            steps: 0,
        };
        log::info!(
            "Starting simulation of {} models with {} pending events",
            simulator.models.len(),
            simulator.queue.len()
        );
        simulator.halt_if_idle();
        Ok(simulator)
    }
}

/// A single simulation run.
///
/// Owns the models, the coupling network, the event queue, and the trace for the duration of
/// the run. Each [`step`](Self::step) processes all events at the smallest pending instant:
///
/// 1. outputs are collected from models with internal or confluent events,
/// 2. outputs are routed to their destinations, possibly scheduling new events at the same
///    instant, or appended to the trace,
/// 3. transitions are applied,
/// 4. every model that had an event is asked for its next internal event time.
pub struct Simulator<P> {
    models: Vec<Box<dyn AtomicModel<P>>>,
    couplings: CouplingTable,
    queue: EventQueue<P>,
    outputs: Vec<Option<P>>,
    trace: Trace<P>,
    status: Status,
    steps: usize,
}

impl<P: fmt::Debug> Simulator<P> {
    /// Starts configuring a simulation.
    #[must_use]
    pub fn builder() -> SimulatorBuilder<P> {
        SimulatorBuilder::default()
    }

    /// Processes the imminent events and returns their time, or `None` if the run has halted.
    ///
    /// The returned times are non-decreasing across steps. The same time may be returned by
    /// consecutive steps when outputs cascade through the network within one instant.
    ///
    /// # Errors
    ///
    /// Returns an error if a transition fails, or a model requests an internal event in the
    /// past or at a NaN time. The run must not be continued afterwards.
    pub fn step(&mut self) -> Result<Option<f64>, SimulationError> {
        let now = match self.queue.time_advance() {
            Some(now) => now,
            None => {
                self.halt_if_idle();
                return Ok(None);
            }
        };
        let r = now.into_inner();
        let imminent = self.queue.next_events();
        self.steps += 1;
        log::debug!(
            "[{}] Step {}: {} imminent event(s)",
            r,
            self.steps,
            imminent.len()
        );

        for output in &mut self.outputs {
            *output = None;
        }
        for event in imminent.iter().filter(|e| e.produces_output()) {
            let model = event.model();
            self.outputs[usize::from(model)] = self.models[usize::from(model)].output();
        }
        self.route_outputs(now);

        for event in &imminent {
            self.transition(event, r)?;
        }
        for event in &imminent {
            self.reschedule(event.model(), r)?;
        }

        self.halt_if_idle();
        Ok(Some(r))
    }

    /// Runs until the event queue is exhausted and returns the trace.
    ///
    /// # Errors
    ///
    /// See [`step`](Self::step).
    pub fn simulate(mut self) -> Result<Trace<P>, SimulationError> {
        while self.step()?.is_some() {}
        log::info!(
            "Simulation halted after {} steps with {} output records",
            self.steps,
            self.trace.len()
        );
        Ok(self.trace)
    }

    /// Current state of the run.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Number of steps processed so far.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Smallest pending real time, if any.
    #[must_use]
    pub fn time_advance(&self) -> Option<f64> {
        self.queue.time_advance().map(RealTime::into_inner)
    }

    /// Pending events.
    #[must_use]
    pub fn queue(&self) -> &EventQueue<P> {
        &self.queue
    }

    /// Coupling network of this run.
    #[must_use]
    pub fn couplings(&self) -> &CouplingTable {
        &self.couplings
    }

    /// Records produced so far.
    #[must_use]
    pub fn trace(&self) -> &Trace<P> {
        &self.trace
    }

    /// Ends the run early and returns the records produced so far.
    #[must_use]
    pub fn into_trace(self) -> Trace<P> {
        self.trace
    }

    /// Routes recorded outputs in model ID order.
    fn route_outputs(&mut self, now: RealTime) {
        let r = now.into_inner();
        for (idx, output) in self.outputs.iter_mut().enumerate() {
            let output = match output.take() {
                Some(output) => output,
                None => continue,
            };
            let model = ModelId::from(idx);
            match self.couplings.destination(model) {
                Some(Destination::SystemOutput) => {
                    log::trace!("[{}] Model {} emitted {:?}", r, model, output);
                    self.trace.push(r, output);
                }
                Some(Destination::Model(target)) => {
                    log::trace!("[{}] Model {} sent {:?} to model {}", r, model, output, target);
                    self.queue.schedule_external(output, now, target);
                }
                None => log::trace!("[{}] Output {:?} of model {} dropped", r, output, model),
            }
        }
    }

    fn transition(&mut self, event: &Event<P>, r: f64) -> Result<(), SimulationError> {
        let model = event.model();
        let target = &mut self.models[usize::from(model)];
        let result = match event {
            Event::Internal { .. } => target.internal_transition(r),
            Event::External { inputs, .. } => target.external_transition(inputs, r),
            Event::Confluent { inputs, .. } => target.confluent_transition(inputs, r),
        };
        result.map_err(|source| SimulationError::Model {
            model,
            time: r,
            source,
        })
    }

    /// Schedules the next internal event of `model` unless it is passive.
    fn reschedule(&mut self, model: ModelId, now: f64) -> Result<(), SimulationError> {
        let next = self.models[usize::from(model)].next_internal_event_time();
        let next_time = real_time(next)?;
        if next == f64::INFINITY {
            return Ok(());
        }
        if next < now {
            return Err(SimulationError::NonCausalEvent {
                model,
                requested: next,
                current: now,
            });
        }
        self.queue.schedule_internal(next_time, model);
        Ok(())
    }

    fn halt_if_idle(&mut self) {
        if self.queue.is_empty() && self.status == Status::Running {
            log::debug!("Event queue exhausted");
            self.status = Status::Halted;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{EventKind, Machine, ModelError};

    use std::cell::RefCell;
    use std::rc::Rc;

    use rstest::rstest;

    type Calls = Rc<RefCell<Vec<(usize, &'static str, f64)>>>;

    /// Emits its ID once per scripted internal event and records every call.
    struct Scripted {
        id: usize,
        internal: Vec<f64>,
        calls: Calls,
    }

    impl Scripted {
        fn new(id: usize, internal: &[f64], calls: &Calls) -> Self {
            let mut internal = internal.to_vec();
            internal.reverse();
            Self {
                id,
                internal,
                calls: Rc::clone(calls),
            }
        }
    }

    impl AtomicModel<usize> for Scripted {
        fn output(&self) -> Option<usize> {
            self.calls.borrow_mut().push((self.id, "output", f64::NAN));
            Some(self.id)
        }
        fn internal_transition(&mut self, time: f64) -> Result<(), ModelError> {
            self.calls.borrow_mut().push((self.id, "internal", time));
            self.internal.pop();
            Ok(())
        }
        fn external_transition(&mut self, _: &[usize], time: f64) -> Result<(), ModelError> {
            self.calls.borrow_mut().push((self.id, "external", time));
            Ok(())
        }
        fn confluent_transition(&mut self, _: &[usize], time: f64) -> Result<(), ModelError> {
            self.calls.borrow_mut().push((self.id, "confluent", time));
            self.internal.pop();
            Ok(())
        }
        fn next_internal_event_time(&self) -> f64 {
            self.internal.last().copied().unwrap_or(f64::INFINITY)
        }
    }

    fn names(calls: &Calls) -> Vec<(usize, &'static str)> {
        calls.borrow().iter().map(|&(id, name, _)| (id, name)).collect()
    }

    #[test]
    fn test_missing_configuration() {
        let mut builder = Simulator::<usize>::builder();
        let calls = Calls::default();
        let a = builder.add_model(Scripted::new(0, &[], &calls));
        assert!(matches!(
            builder.build(),
            Err(SimulationError::MissingEntryPoint)
        ));

        let mut builder = Simulator::<usize>::builder();
        builder.add_model(Scripted::new(0, &[], &calls));
        builder.route_input_to(a);
        assert!(matches!(
            builder.build(),
            Err(SimulationError::MissingExitPoint)
        ));
    }

    #[test]
    fn test_nan_input_rejected() {
        let mut builder = Simulator::<String>::builder();
        let machine = builder.add_model(Machine::press());
        builder
            .route_input_to(machine)
            .take_output_from(machine)
            .add_input(f64::NAN, String::from("1"));
        assert!(matches!(
            builder.build(),
            Err(SimulationError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_no_inputs_halts_immediately() {
        let mut builder = Simulator::<String>::builder();
        let press = builder.add_model(Machine::press());
        let drill = builder.add_model(Machine::drill());
        builder
            .add_coupling(press, drill)
            .route_input_to(press)
            .take_output_from(drill);
        let mut simulator = builder.build().unwrap();
        assert_eq!(simulator.status(), Status::Halted);
        assert_eq!(simulator.step().unwrap(), None);
        assert_eq!(simulator.steps(), 0);
        assert!(simulator.simulate().unwrap().is_empty());
    }

    #[test]
    fn test_inputs_seed_entry_point() {
        let mut builder = Simulator::<String>::builder();
        let press = builder.add_model(Machine::press());
        builder
            .route_input_to(press)
            .take_output_from(press)
            .add_input(2.7, String::from("2"))
            .add_input(1.5, String::from("12"))
            .add_input(2.7, String::from("3"));
        let simulator = builder.build().unwrap();
        assert_eq!(simulator.status(), Status::Running);
        let seeded: Vec<_> = simulator
            .queue()
            .iter()
            .map(|e| (e.kind(), e.time().real().into_inner(), e.inputs().to_vec()))
            .collect();
        assert_eq!(
            seeded,
            vec![
                (EventKind::External, 1.5, vec![String::from("12")]),
                (EventKind::External, 2.7, vec![String::from("3")]),
            ]
        );
    }

    #[test]
    fn test_output_precedes_transition() {
        let calls = Calls::default();
        let mut builder = Simulator::<usize>::builder();
        let a = builder.add_model(Scripted::new(0, &[1.0, 3.0], &calls));
        let b = builder.add_model(Scripted::new(1, &[], &calls));
        builder
            .add_coupling(a, b)
            .route_input_to(a)
            .take_output_from(b)
            .add_input(0.5, 7);
        let trace = builder.build().unwrap().simulate().unwrap();
        assert!(trace.is_empty());
        assert_eq!(
            names(&calls),
            vec![
                (0, "external"),
                (0, "output"),
                (0, "internal"),
                (1, "external"),
                (0, "output"),
                (0, "internal"),
                (1, "external"),
            ]
        );
    }

    #[test]
    fn test_steps_within_one_instant() {
        let calls = Calls::default();
        let mut builder = Simulator::<usize>::builder();
        let a = builder.add_model(Scripted::new(0, &[2.0], &calls));
        let b = builder.add_model(Scripted::new(1, &[], &calls));
        builder
            .add_coupling(a, b)
            .route_input_to(a)
            .take_output_from(b)
            .add_input(1.0, 5);
        let mut simulator = builder.build().unwrap();
        assert_eq!(simulator.time_advance(), Some(1.0));
        assert_eq!(simulator.step().unwrap(), Some(1.0));
        assert_eq!(simulator.step().unwrap(), Some(2.0));
        assert_eq!(simulator.queue().len(), 1);
        assert_eq!(simulator.step().unwrap(), Some(2.0));
        assert_eq!(simulator.status(), Status::Halted);
        assert_eq!(simulator.step().unwrap(), None);
        assert_eq!(simulator.steps(), 3);
        assert_eq!(
            names(&calls),
            vec![(0, "external"), (0, "output"), (0, "internal"), (1, "external")]
        );
    }

    #[test]
    fn test_single_confluent_transition() {
        let calls = Calls::default();
        let mut builder = Simulator::<usize>::builder();
        let a = builder.add_model(Scripted::new(0, &[2.0], &calls));
        builder
            .route_input_to(a)
            .take_output_from(a)
            .add_input(1.0, 41)
            .add_input(2.0, 42);
        let trace = builder.build().unwrap().simulate().unwrap();
        assert_eq!(trace.into_records().len(), 1);
        assert_eq!(
            names(&calls),
            vec![(0, "external"), (0, "output"), (0, "confluent")]
        );
    }

    #[test]
    fn test_output_without_destination_is_dropped() {
        let calls = Calls::default();
        let mut builder = Simulator::<usize>::builder();
        let a = builder.add_model(Scripted::new(0, &[], &calls));
        let b = builder.add_model(Scripted::new(1, &[1.0], &calls));
        builder
            .route_input_to(b)
            .take_output_from(a)
            .add_input(0.5, 3);
        let trace = builder.build().unwrap().simulate().unwrap();
        assert!(trace.is_empty());
        assert_eq!(
            names(&calls),
            vec![(1, "external"), (1, "output"), (1, "internal")]
        );
    }

    /// Passive until it receives an input, then asks for its next event at `requested`.
    struct Requesting {
        requested: f64,
        next: f64,
    }

    impl AtomicModel<usize> for Requesting {
        fn output(&self) -> Option<usize> {
            None
        }
        fn internal_transition(&mut self, _: f64) -> Result<(), ModelError> {
            Ok(())
        }
        fn external_transition(&mut self, _: &[usize], _: f64) -> Result<(), ModelError> {
            self.next = self.requested;
            Ok(())
        }
        fn confluent_transition(&mut self, _: &[usize], _: f64) -> Result<(), ModelError> {
            Ok(())
        }
        fn next_internal_event_time(&self) -> f64 {
            self.next
        }
    }

    fn requesting(requested: f64) -> Simulator<usize> {
        let mut builder = Simulator::builder();
        let model = builder.add_model(Requesting {
            requested,
            next: f64::INFINITY,
        });
        builder
            .route_input_to(model)
            .take_output_from(model)
            .add_input(1.0, 0);
        builder.build().unwrap()
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.999)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_causal_event(#[case] requested: f64) {
        let mut simulator = requesting(requested);
        match simulator.step() {
            Err(SimulationError::NonCausalEvent {
                requested: r,
                current,
                ..
            }) => {
                assert_eq!(r, requested);
                assert_eq!(current, 1.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_nan_next_event_time() {
        let mut simulator = requesting(f64::NAN);
        assert!(matches!(
            simulator.step(),
            Err(SimulationError::InvalidTime(r)) if r.is_nan()
        ));
    }

    #[rstest]
    #[case(1.0)]
    #[case(f64::INFINITY)]
    fn test_valid_next_event_time(#[case] requested: f64) {
        let mut simulator = requesting(requested);
        assert_eq!(simulator.step().unwrap(), Some(1.0));
        assert_eq!(simulator.queue().len(), usize::from(requested.is_finite()));
    }

    #[rstest]
    #[case("x")]
    #[case("-3")]
    fn test_malformed_payload_aborts_run(#[case] payload: &str) {
        let mut builder = Simulator::<String>::builder();
        let press = builder.add_model(Machine::press());
        builder
            .route_input_to(press)
            .take_output_from(press)
            .add_input(1.0, String::from("2"))
            .add_input(1.5, payload.to_string());
        let err = builder.build().unwrap().simulate().unwrap_err();
        match err {
            SimulationError::Model {
                model,
                time,
                source: ModelError::MalformedPayload { payload: p, .. },
            } => {
                assert_eq!(model, press);
                assert_eq!(time, 1.5);
                assert_eq!(p, payload);
            }
            err => panic!("unexpected error: {}", err),
        }
    }
}
