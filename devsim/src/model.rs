use crate::ModelError;

/// Capabilities of an atomic model, the only interface between the simulator and the
/// simulated entities.
///
/// Times passed to and returned from a model are absolute simulation times. A model that does
/// not expect any autonomous event returns [`f64::INFINITY`] from
/// [`next_internal_event_time`](AtomicModel::next_internal_event_time).
///
/// Inputs are delivered as a bag: all payloads routed to the model at the same instant, in
/// arrival order. In a network where every model has a single upstream source, the bag
/// always contains exactly one payload.
pub trait AtomicModel<P> {
    /// Output emitted right before an internal or confluent transition, computed from the
    /// state before the transition. Never called for a purely external event.
    fn output(&self) -> Option<P>;

    /// Autonomous state change at `time`.
    ///
    /// # Errors
    ///
    /// Model-specific; any error aborts the run.
    fn internal_transition(&mut self, time: f64) -> Result<(), ModelError>;

    /// State change caused by `inputs` received at `time`, with no coincident autonomous
    /// event.
    ///
    /// # Errors
    ///
    /// Typically [`ModelError::MalformedPayload`] when an input cannot be interpreted.
    fn external_transition(&mut self, inputs: &[P], time: f64) -> Result<(), ModelError>;

    /// State change when an autonomous event and received `inputs` occur at the same `time`.
    /// How the two are combined is up to the model.
    ///
    /// # Errors
    ///
    /// Typically [`ModelError::MalformedPayload`] when an input cannot be interpreted.
    fn confluent_transition(&mut self, inputs: &[P], time: f64) -> Result<(), ModelError>;

    /// Absolute time of the next autonomous event, queried after every transition. A model
    /// is passive until its first input arrives, whatever it returns before that.
    fn next_internal_event_time(&self) -> f64;
}
