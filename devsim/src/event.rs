use crate::{ModelId, Time};

/// Kind of a pending event, determining which transition function the simulator invokes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// Autonomous transition of a model.
    Internal,
    /// Delivery of inputs to a model with no coincident autonomous transition.
    External,
    /// Autonomous transition and delivery of inputs happening at the same instant.
    Confluent,
}

/// Event pending in the [`EventQueue`](crate::EventQueue).
///
/// External and confluent events carry the bag of payloads delivered to the model at their
/// instant, in arrival order. Several payloads end up in one bag only when more than one
/// source routes to the same model at the same instant.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<P> {
    /// See [`EventKind::Internal`].
    Internal {
        /// Target model.
        model: ModelId,
        /// When the event occurs.
        time: Time,
    },
    /// See [`EventKind::External`].
    External {
        /// Target model.
        model: ModelId,
        /// When the event occurs.
        time: Time,
        /// Delivered payloads.
        inputs: Vec<P>,
    },
    /// See [`EventKind::Confluent`].
    Confluent {
        /// Target model.
        model: ModelId,
        /// When the event occurs.
        time: Time,
        /// Delivered payloads.
        inputs: Vec<P>,
    },
}

impl<P> Event<P> {
    /// The model this event targets.
    #[must_use]
    pub fn model(&self) -> ModelId {
        match self {
            Event::Internal { model, .. }
            | Event::External { model, .. }
            | Event::Confluent { model, .. } => *model,
        }
    }

    /// The time at which this event occurs.
    #[must_use]
    pub fn time(&self) -> Time {
        match self {
            Event::Internal { time, .. }
            | Event::External { time, .. }
            | Event::Confluent { time, .. } => *time,
        }
    }

    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Internal { .. } => EventKind::Internal,
            Event::External { .. } => EventKind::External,
            Event::Confluent { .. } => EventKind::Confluent,
        }
    }

    /// Payloads delivered with this event; empty for internal events.
    #[must_use]
    pub fn inputs(&self) -> &[P] {
        match self {
            Event::Internal { .. } => &[],
            Event::External { inputs, .. } | Event::Confluent { inputs, .. } => inputs,
        }
    }

    /// Whether the model's output function must be evaluated for this event.
    #[must_use]
    pub fn produces_output(&self) -> bool {
        !matches!(self, Event::External { .. })
    }
}
