//! Discrete-event simulation kernel following the DEVS execution model.
//!
//! Atomic models exchange timestamped payloads through a coupling network. The simulator
//! repeatedly takes the *imminent* events (all pending events sharing the smallest real time)
//! from the [`EventQueue`], collects the outputs of models with internal or confluent events,
//! routes them through the [`CouplingTable`], applies the transitions, and reschedules the
//! affected models. The run halts once the queue is empty.
//!
//! ```
//! # use devsim::{Machine, Simulator};
//! # fn main() -> Result<(), devsim::SimulationError> {
//! let mut builder = Simulator::builder();
//! let press = builder.add_model(Machine::press());
//! let drill = builder.add_model(Machine::new(2.0, "1"));
//! builder
//!     .add_coupling(press, drill)
//!     .route_input_to(press)
//!     .take_output_from(drill)
//!     .add_input(1.5, String::from("2"));
//! let trace = builder.build()?.simulate()?;
//! let times: Vec<f64> = trace.iter().map(|record| record.time).collect();
//! assert_eq!(times, vec![4.5, 6.5]);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::inline_always
)]

use derive_more::{Display, From, Into};

mod coupling;
pub use coupling::{CouplingTable, Destination, Source};

mod error;
pub use error::{ModelError, SimulationError};

mod event;
pub use event::{Event, EventKind};

mod machine;
pub use machine::Machine;

mod model;
pub use model::AtomicModel;

mod queue;
pub use queue::EventQueue;

pub mod scenario;

mod simulator;
pub use simulator::{Simulator, SimulatorBuilder, Status};

mod time;
pub use time::{real_time, RealTime, Time};

mod trace;
pub use trace::{Trace, TraceRecord};

/// Model ID.
///
/// Assigned in registration order by [`SimulatorBuilder::add_model`]; all per-model side
/// tables of the simulator are indexed by it.
#[derive(From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Hash, Display)]
pub struct ModelId(usize);
