use thiserror::Error;

use crate::{ModelId, Source};

/// Failure raised by a model's transition function.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model received a payload it could not interpret.
    #[error("malformed payload `{payload}`")]
    MalformedPayload {
        /// The offending payload, as text.
        payload: String,
        /// The underlying parsing error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Any other model-specific failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors aborting the configuration or the run of a simulation.
///
/// Configuration errors are reported by [`SimulatorBuilder::build`](crate::SimulatorBuilder::build)
/// before any event is processed. Run errors end the current run; there are no retries.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// No model has been designated as the network's entry point.
    #[error("no model receives the system input")]
    MissingEntryPoint,
    /// No model has been designated as the network's exit point.
    #[error("no model sends its output to the system output")]
    MissingExitPoint,
    /// A coupling refers to a model that was never registered.
    #[error("model {0} is not registered")]
    UnknownModel(ModelId),
    /// A source already has a destination.
    #[error("{0} is already coupled")]
    DuplicateCoupling(Source),
    /// Another model is already the network's exit point.
    #[error("model {requested} cannot be the exit point: model {existing} already is")]
    DuplicateExitPoint {
        /// Current exit point.
        existing: ModelId,
        /// Model requested as the second exit point.
        requested: ModelId,
    },
    /// A time was NaN.
    #[error("invalid simulation time: {0}")]
    InvalidTime(f64),
    /// A model requested its next internal event before the current simulation time.
    #[error("model {model} scheduled an internal event at {requested} while simulation is at {current}")]
    NonCausalEvent {
        /// Model requesting the event.
        model: ModelId,
        /// Requested time.
        requested: f64,
        /// Current simulation time.
        current: f64,
    },
    /// A model's transition failed.
    #[error("model {model} failed at time {time}")]
    Model {
        /// Failing model.
        model: ModelId,
        /// Simulation time of the failure.
        time: f64,
        /// What went wrong.
        #[source]
        source: ModelError,
    },
}
