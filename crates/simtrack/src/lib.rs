//! simtrack
//!
//! Bookkeeping for scientific simulation runs stored as directory trees on
//! a shared filesystem: typed parameter files, run-status classification
//! from scheduler/log output, and queryable grids of runs for parameter
//! sweeps. The filesystem is the sole source of truth; nothing here caches
//! derived state.

pub mod checkpoint;
pub mod code;
pub mod codes;
pub mod error;
pub mod grid;
pub mod params;
pub mod simulation;
pub mod value;

pub use checkpoint::{Checkpoint, DatasetOpener};
pub use code::SimCode;
pub use codes::{Cholla, Flash};
pub use error::{Error, Result};
pub use grid::SimulationGrid;
pub use params::ParameterFile;
pub use simulation::{Reason, Simulation};
pub use value::{ParamFormat, ParamValue};
