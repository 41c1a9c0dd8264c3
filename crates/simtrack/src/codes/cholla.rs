//! Cholla hydrodynamics code conventions.
//!
//! Cholla writes no log of its own; submission captures the solver's
//! stdout into `output.log` inside the run folder, and status detection
//! reads that single file.

use std::path::{Path, PathBuf};

use crate::code::SimCode;
use crate::simulation::Reason;
use crate::value::ParamFormat;

use super::chk_files;

#[derive(Debug)]
pub struct Cholla;

impl SimCode for Cholla {
    const NAME: &'static str = "cholla";

    fn format() -> ParamFormat {
        ParamFormat {
            true_string: "1",
            false_string: "0",
            quotes_around_string: false,
            lowercase_keys: false,
        }
    }

    fn default_par_name() -> &'static str {
        "input.txt"
    }

    fn is_sim_folder(path: &Path) -> bool {
        path.join("input.txt").is_file()
    }

    fn log_files(folder: &Path) -> Vec<PathBuf> {
        let log = folder.join("output.log");
        if log.is_file() {
            vec![log]
        } else {
            Vec::new()
        }
    }

    fn complete_marker() -> &'static str {
        "Integration complete"
    }

    /// Cholla prints no distinguishable failure markers; incomplete runs
    /// classify as not-ran or unknown.
    fn incomplete_markers() -> &'static [(&'static str, Reason)] {
        &[]
    }

    fn checkpoint_paths(folder: &Path) -> Vec<PathBuf> {
        chk_files(folder)
    }

    fn restart_keys() -> (&'static str, &'static str) {
        ("restart", "nfile")
    }

    fn stdout_log() -> Option<&'static str> {
        Some("output.log")
    }
}
