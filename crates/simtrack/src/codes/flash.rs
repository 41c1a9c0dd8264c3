//! FLASH hydrodynamics code conventions.
//!
//! FLASH runs under SLURM and leaves one `slurm-*.out` per submission.
//! Shared folders can also hold scheduler output from unrelated jobs, so a
//! slurm file only qualifies as a FLASH log when it shows the code's own
//! startup banner.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::code::SimCode;
use crate::simulation::Reason;
use crate::value::ParamFormat;

use super::{chk_files, files_where};

/// Banner lines FLASH prints early in every run.
const STARTUP_BANNERS: [&str; 2] = ["Driver init all done", "RuntimeParameters"];

#[derive(Debug)]
pub struct Flash;

impl SimCode for Flash {
    const NAME: &'static str = "flash";

    fn format() -> ParamFormat {
        ParamFormat {
            true_string: ".true.",
            false_string: ".false.",
            quotes_around_string: true,
            // flash.par keys are case-insensitive
            lowercase_keys: true,
        }
    }

    fn default_par_name() -> &'static str {
        "flash.par"
    }

    fn is_sim_folder(path: &Path) -> bool {
        path.join("flash.par").is_file()
    }

    /// `slurm-*.out` files ordered by modification time, keeping only
    /// those whose content shows a FLASH startup banner.
    fn log_files(folder: &Path) -> Vec<PathBuf> {
        let mut files =
            files_where(folder, |name| name.starts_with("slurm") && name.ends_with(".out"));
        files.sort_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        });
        files.retain(|path| match fs::read(path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                STARTUP_BANNERS.iter().any(|banner| content.contains(banner))
            }
            Err(_) => false,
        });
        files
    }

    fn complete_marker() -> &'static str {
        "reached max SimTime"
    }

    fn incomplete_markers() -> &'static [(&'static str, Reason)] {
        &[
            ("DUE TO TIME LIMIT", Reason::TimeLimit),
            ("DUE TO PREEMPTION", Reason::Preemption),
            ("DRIVER_ABORT", Reason::Crashed),
        ]
    }

    fn checkpoint_paths(folder: &Path) -> Vec<PathBuf> {
        chk_files(folder)
    }

    fn restart_keys() -> (&'static str, &'static str) {
        ("restart", "checkpointfilenumber")
    }
}
