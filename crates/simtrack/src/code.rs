//! Simulation-code capability trait.
//!
//! Everything that varies between simulation codes — parameter-file
//! conventions, folder detection, log discovery, status markers,
//! restart keys — lives behind [`SimCode`]. [`crate::Simulation`] and
//! [`crate::SimulationGrid`] are generic over it, so adding a code means
//! implementing this trait on a unit struct and nothing else.

use std::path::{Path, PathBuf};

use crate::simulation::Reason;
use crate::value::ParamFormat;

/// Conventions of one concrete simulation code.
pub trait SimCode {
    /// Short diagnostic label ("flash", "cholla", ...).
    const NAME: &'static str;

    /// String conventions of the code's parameter format.
    fn format() -> ParamFormat;

    /// Canonical parameter-file name inside a run folder.
    fn default_par_name() -> &'static str;

    /// Whether a folder holds a run of this code.
    ///
    /// The sole filesystem-shape contract between the grid and a code:
    /// typically "does the folder contain the canonical parameter file".
    fn is_sim_folder(path: &Path) -> bool;

    /// Qualifying log artifacts for a run folder, oldest first.
    ///
    /// Status queries only ever look at the last entry. An empty vec is
    /// valid and means the run never produced output.
    fn log_files(folder: &Path) -> Vec<PathBuf>;

    /// Substring in a log that marks a completed run.
    fn complete_marker() -> &'static str;

    /// Ordered (substring, reason) pairs for incomplete-run triage;
    /// first match wins.
    fn incomplete_markers() -> &'static [(&'static str, Reason)];

    /// Checkpoint files in a run folder, sorted by name.
    fn checkpoint_paths(folder: &Path) -> Vec<PathBuf>;

    /// Parameter keys set on restart: (resume flag, checkpoint number).
    fn restart_keys() -> (&'static str, &'static str);

    /// Log file to capture the submission command's stdout into, if the
    /// code relies on that capture for status detection.
    fn stdout_log() -> Option<&'static str> {
        None
    }
}
