use derive_more::Display;

use crate::{ModelId, SimulationError};

/// Origin of a routed payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum Source {
    /// Exogenous inputs of the whole network.
    #[display(fmt = "system input")]
    SystemInput,
    /// Output of a model.
    #[display(fmt = "model {}", _0)]
    Model(ModelId),
}

/// Where a model's output goes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum Destination {
    /// Delivered as an external input to another model.
    #[display(fmt = "model {}", _0)]
    Model(ModelId),
    /// Appended to the trace of the run.
    #[display(fmt = "system output")]
    SystemOutput,
}

/// Routing table of the coupling network.
///
/// Every model has at most one destination. Exactly one model receives the system input,
/// and exactly one model sends its output to the system output. Models without a destination
/// silently drop their output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouplingTable {
    entry: ModelId,
    exit: ModelId,
    routes: Vec<Option<Destination>>,
}

impl CouplingTable {
    /// Validates the couplings of a network of `num_models` models and builds the table.
    ///
    /// `entries` lists every model designated to receive the system input, and `routes`
    /// every `(source, destination)` pair, in the order they were configured.
    pub(crate) fn new(
        num_models: usize,
        entries: &[ModelId],
        routes: &[(ModelId, Destination)],
    ) -> Result<Self, SimulationError> {
        let registered = |model: ModelId| {
            if usize::from(model) < num_models {
                Ok(model)
            } else {
                Err(SimulationError::UnknownModel(model))
            }
        };
        let entry = match entries {
            [] => return Err(SimulationError::MissingEntryPoint),
            [entry] => registered(*entry)?,
            [_, _, ..] => return Err(SimulationError::DuplicateCoupling(Source::SystemInput)),
        };
        let mut table = vec![None; num_models];
        let mut exit: Option<ModelId> = None;
        for &(source, destination) in routes {
            registered(source)?;
            if let Destination::Model(target) = destination {
                registered(target)?;
            }
            let slot = &mut table[usize::from(source)];
            if slot.is_some() {
                return Err(SimulationError::DuplicateCoupling(Source::Model(source)));
            }
            *slot = Some(destination);
            if destination == Destination::SystemOutput {
                if let Some(existing) = exit {
                    return Err(SimulationError::DuplicateExitPoint {
                        existing,
                        requested: source,
                    });
                }
                exit = Some(source);
            }
        }
        let exit = exit.ok_or(SimulationError::MissingExitPoint)?;
        Ok(Self {
            entry,
            exit,
            routes: table,
        })
    }

    /// The model receiving the system input.
    #[must_use]
    pub fn entry_point(&self) -> ModelId {
        self.entry
    }

    /// The model whose output reaches the system output.
    #[must_use]
    pub fn exit_point(&self) -> ModelId {
        self.exit
    }

    /// Destination of `model`'s output, if any.
    #[must_use]
    pub fn destination(&self, model: ModelId) -> Option<Destination> {
        self.routes.get(usize::from(model)).copied().flatten()
    }
}
