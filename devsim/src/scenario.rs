//! Simulation scenarios read from files.
//!
//! A scenario describes a network of [`Machine`]s, how they are coupled, and the exogenous
//! inputs of the run. Models are referred to by name:
//!
//! ```json
//! {
//!     "models": [
//!         { "kind": "press", "name": "press" },
//!         { "kind": "drill", "name": "drill" },
//!         { "kind": "machine", "name": "lathe", "cycle": 0.5, "output": "1" }
//!     ],
//!     "couplings": [{ "from": "press", "to": "drill" }],
//!     "entry": "press",
//!     "exit": "drill",
//!     "inputs": [{ "time": 1.5, "payload": "12" }]
//! }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Machine, ModelId, SimulatorBuilder};

/// Errors encountered while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file cannot be opened.
    #[error("unable to open scenario file: {}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Invalid JSON scenario.
    #[error("unable to parse scenario in JSON format")]
    Json(#[from] serde_json::Error),
    /// Invalid MessagePack scenario.
    #[error("unable to parse scenario in MessagePack format")]
    MessagePack(#[from] rmp_serde::decode::Error),
    /// Two models share a name.
    #[error("model `{0}` is defined more than once")]
    DuplicateModel(String),
    /// A name does not refer to any model.
    #[error("unknown model `{0}`")]
    UnknownModel(String),
}

/// A named machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    /// See [`Machine::press`].
    Press {
        /// Model name.
        name: String,
    },
    /// See [`Machine::drill`].
    Drill {
        /// Model name.
        name: String,
    },
    /// See [`Machine::new`].
    Machine {
        /// Model name.
        name: String,
        /// Processing time of one part.
        cycle: f64,
        /// Label emitted for each finished part.
        output: String,
    },
}

impl ModelConfig {
    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ModelConfig::Press { name }
            | ModelConfig::Drill { name }
            | ModelConfig::Machine { name, .. } => name,
        }
    }

    fn machine(&self) -> Machine {
        match self {
            ModelConfig::Press { .. } => Machine::press(),
            ModelConfig::Drill { .. } => Machine::drill(),
            ModelConfig::Machine { cycle, output, .. } => Machine::new(*cycle, output.as_str()),
        }
    }
}

/// Routes the output of one model to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// Name of the source model.
    pub from: String,
    /// Name of the destination model.
    pub to: String,
}

/// Exogenous input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Absolute simulation time.
    pub time: f64,
    /// Payload delivered to the entry point.
    pub payload: String,
}

/// Complete description of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Models, registered in the listed order.
    pub models: Vec<ModelConfig>,
    /// Model-to-model couplings.
    #[serde(default)]
    pub couplings: Vec<CouplingConfig>,
    /// Name of the model receiving the exogenous inputs.
    pub entry: String,
    /// Name of the model whose output makes up the trace.
    pub exit: String,
    /// Exogenous inputs.
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

impl Scenario {
    /// Reads a scenario from a file.
    ///
    /// If the file's extension is `.json`, then it will treat it as a JSON file.
    /// Otherwise, it will be treated as a binary [MessagePack](https://msgpack.org) file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let file = File::open(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        if path.extension().map_or(false, |e| e == "json") {
            Ok(serde_json::from_reader(reader)?)
        } else {
            Ok(rmp_serde::from_read(reader)?)
        }
    }

    /// Registers the scenario's models, couplings, and inputs in a new builder.
    ///
    /// # Errors
    ///
    /// Returns an error if model names are not unique, or a coupling, the entry, or the exit
    /// refers to an undefined name. Other configuration errors are reported by
    /// [`SimulatorBuilder::build`].
    pub fn builder(&self) -> Result<SimulatorBuilder<String>, ScenarioError> {
        let mut builder = SimulatorBuilder::default();
        let mut ids: HashMap<&str, ModelId> = HashMap::new();
        for model in &self.models {
            let id = builder.add_model(model.machine());
            if ids.insert(model.name(), id).is_some() {
                return Err(ScenarioError::DuplicateModel(model.name().to_string()));
            }
        }
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ScenarioError::UnknownModel(name.to_string()))
        };
        for coupling in &self.couplings {
            builder.add_coupling(lookup(&coupling.from)?, lookup(&coupling.to)?);
        }
        builder
            .route_input_to(lookup(&self.entry)?)
            .take_output_from(lookup(&self.exit)?);
        for input in &self.inputs {
            builder.add_input(input.time, input.payload.clone());
        }
        Ok(builder)
    }
}
