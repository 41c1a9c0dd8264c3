//! A single simulation run folder and its derived status.
//!
//! Status is never stored: `complete`, `reason_incomplete` and `failed`
//! re-read the log artifacts on every call, so the answer always reflects
//! the live filesystem. Callers that need caching add it above this layer.

use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkpoint::{self, Checkpoint};
use crate::code::SimCode;
use crate::error::{Error, Result};
use crate::params::ParameterFile;

/// Why an incomplete simulation stopped (or never started).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// No log artifacts exist at all
    #[serde(rename = "not ran")]
    NotRan,
    /// The scheduler killed the job at its time limit
    #[serde(rename = "time limit")]
    TimeLimit,
    /// The scheduler preempted the job
    #[serde(rename = "preemption")]
    Preemption,
    /// The code aborted
    #[serde(rename = "crashed")]
    Crashed,
    /// Logs exist but match no known marker
    #[serde(rename = "unknown")]
    Unknown,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::NotRan => "not ran",
            Reason::TimeLimit => "time limit",
            Reason::Preemption => "preemption",
            Reason::Crashed => "crashed",
            Reason::Unknown => "unknown",
        };
        write!(f, "{text}")
    }
}

/// One simulation run, identified by its folder.
///
/// Owns the folder's [`ParameterFile`], loaded eagerly on construction.
#[derive(Debug)]
pub struct Simulation<C: SimCode> {
    path: PathBuf,
    par: ParameterFile,
    _code: PhantomData<C>,
}

impl<C: SimCode> Simulation<C> {
    /// Open the run folder at `path` using the code's canonical
    /// parameter-file name.
    ///
    /// # Errors
    /// [`Error::MissingParameterFile`] when the folder has no such file;
    /// [`Error::Parse`] when the file is malformed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, C::default_par_name())
    }

    /// Open with an explicit parameter-file name override.
    pub fn open_with(path: impl Into<PathBuf>, par_name: &str) -> Result<Self> {
        let path = path.into();
        let par_path = path.join(par_name);
        if !par_path.is_file() {
            return Err(Error::MissingParameterFile(par_path));
        }
        let par = ParameterFile::read(par_path, C::format())?;
        Ok(Self {
            path,
            par,
            _code: PhantomData,
        })
    }

    /// The run folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The run's parameter file.
    pub fn par(&self) -> &ParameterFile {
        &self.par
    }

    pub fn par_mut(&mut self) -> &mut ParameterFile {
        &mut self.par
    }

    /// Most recent qualifying log artifact, if any.
    fn latest_log(&self) -> Option<PathBuf> {
        C::log_files(&self.path).pop()
    }

    /// Whether the run finished.
    ///
    /// True iff the newest qualifying log contains the code's completion
    /// marker. No logs at all means not complete, never an error.
    pub fn complete(&self) -> Result<bool> {
        match self.latest_log() {
            None => Ok(false),
            Some(log) => Ok(read_lossy(&log)?.contains(C::complete_marker())),
        }
    }

    /// Why the run is incomplete.
    ///
    /// Must only be asked of an incomplete run.
    ///
    /// # Errors
    /// [`Error::Precondition`] when the run is complete.
    pub fn reason_incomplete(&self) -> Result<Reason> {
        if self.complete()? {
            return Err(Error::Precondition(format!(
                "simulation at {} is complete",
                self.path.display()
            )));
        }
        let Some(log) = self.latest_log() else {
            return Ok(Reason::NotRan);
        };
        let contents = read_lossy(&log)?;
        for (marker, reason) in C::incomplete_markers() {
            if contents.contains(marker) {
                return Ok(*reason);
            }
        }
        Ok(Reason::Unknown)
    }

    /// Whether the run hit a definite terminal failure.
    ///
    /// False when complete; otherwise true unless the run simply has not
    /// started ([`Reason::NotRan`]) or cannot be classified
    /// ([`Reason::Unknown`]).
    pub fn failed(&self) -> Result<bool> {
        if self.complete()? {
            return Ok(false);
        }
        Ok(!matches!(
            self.reason_incomplete()?,
            Reason::Unknown | Reason::NotRan
        ))
    }

    /// Checkpoints in the run folder, sorted by name.
    pub fn checkpoints<D>(&self) -> Vec<Checkpoint<D>> {
        C::checkpoint_paths(&self.path)
            .into_iter()
            .map(Checkpoint::new)
            .collect()
    }

    /// Submit the run: execute `command` with the folder as working
    /// directory, blocking until it returns.
    ///
    /// When the code declares a stdout log, the command's stdout is
    /// captured into that file inside the folder.
    ///
    /// # Errors
    /// [`Error::ExternalCommand`] on non-zero exit; [`Error::Io`] when the
    /// command cannot be spawned.
    pub fn run<S: AsRef<OsStr>>(&self, command: &[S]) -> Result<()> {
        let (program, args) = command.split_first().ok_or_else(|| {
            Error::Precondition("run command must not be empty".to_string())
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.path);
        if let Some(log_name) = C::stdout_log() {
            let log_path = self.path.join(log_name);
            let log = File::create(&log_path).map_err(|e| Error::Io {
                path: log_path,
                source: e,
            })?;
            cmd.stdout(log);
        }

        debug!(code = C::NAME, path = %self.path.display(), "submitting simulation");
        let status = cmd.status().map_err(|e| Error::Io {
            path: self.path.clone(),
            source: e,
        })?;
        if !status.success() {
            return Err(Error::ExternalCommand { status });
        }
        Ok(())
    }

    /// Resume from the newest checkpoint: set the code's resume flag and
    /// checkpoint-number keys, persist the parameter file, then submit.
    ///
    /// # Errors
    /// [`Error::NoCheckpoints`] when the folder holds no numbered
    /// checkpoint files.
    pub fn restart<S: AsRef<OsStr>>(&mut self, command: &[S]) -> Result<()> {
        let number = C::checkpoint_paths(&self.path)
            .iter()
            .rev()
            .find_map(|p| checkpoint::trailing_number(p))
            .ok_or_else(|| Error::NoCheckpoints(self.path.clone()))?;

        let (resume_key, number_key) = C::restart_keys();
        self.par.set(resume_key, true);
        self.par.set(number_key, number as i64);
        self.par.write()?;
        self.run(command)
    }
}

/// Read a log tolerantly: partial or non-UTF-8 content (a job may still be
/// appending) must classify conservatively instead of crashing.
fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::SimCode;
    use crate::codes::{Cholla, Flash};
    use crate::value::ParamValue;
    use std::io::Write;
    use tempfile::tempdir;

    fn make_cholla_folder(dir: &Path) -> PathBuf {
        let folder = dir.join("run1");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("input.txt"), "steps=10\nrestart=0\nnfile=0\n").unwrap();
        folder
    }

    #[test]
    fn open_without_parameter_file_fails() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("empty");
        fs::create_dir(&folder).unwrap();

        let err = Simulation::<Cholla>::open(&folder).unwrap_err();
        assert!(matches!(err, Error::MissingParameterFile(_)));
    }

    #[test]
    fn open_with_overrides_parameter_file_name() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("run1");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("alt.txt"), "steps=5\n").unwrap();

        let sim = Simulation::<Cholla>::open_with(&folder, "alt.txt").unwrap();
        assert_eq!(sim.par().get("steps").unwrap(), &ParamValue::Int(5));
    }

    #[test]
    fn no_logs_means_incomplete_not_ran() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        assert!(!sim.complete().unwrap());
        assert_eq!(sim.reason_incomplete().unwrap(), Reason::NotRan);
        assert!(!sim.failed().unwrap());
    }

    #[test]
    fn completion_marker_in_log_means_complete() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        fs::write(
            folder.join("output.log"),
            "step 9\nstep 10\nIntegration complete\n",
        )
        .unwrap();

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        assert!(sim.complete().unwrap());
        assert!(!sim.failed().unwrap());
    }

    #[test]
    fn reason_incomplete_on_complete_run_is_a_precondition_error() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        fs::write(folder.join("output.log"), "Integration complete\n").unwrap();

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        assert!(matches!(
            sim.reason_incomplete(),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn unmatched_log_content_classifies_as_unknown() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        fs::write(folder.join("output.log"), "step 3\nstep 4\n").unwrap();

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        assert!(!sim.complete().unwrap());
        assert_eq!(sim.reason_incomplete().unwrap(), Reason::Unknown);
        assert!(!sim.failed().unwrap());
    }

    #[test]
    fn non_utf8_log_does_not_crash_classification() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        let mut log = fs::File::create(folder.join("output.log")).unwrap();
        log.write_all(&[0xff, 0xfe, b'p', b'a', b'r', b't', 0x80]).unwrap();

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        assert!(!sim.complete().unwrap());
        assert_eq!(sim.reason_incomplete().unwrap(), Reason::Unknown);
    }

    fn make_flash_folder(dir: &Path) -> PathBuf {
        let folder = dir.join("blast");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("flash.par"), "restart=.false.\nnend=100\n").unwrap();
        folder
    }

    #[test]
    fn crash_marker_means_failed() {
        let dir = tempdir().unwrap();
        let folder = make_flash_folder(dir.path());
        fs::write(
            folder.join("slurm-100.out"),
            "RuntimeParameters\nstep 3\nDRIVER_ABORT: bad zone\n",
        )
        .unwrap();

        let sim = Simulation::<Flash>::open(&folder).unwrap();
        assert!(!sim.complete().unwrap());
        assert_eq!(sim.reason_incomplete().unwrap(), Reason::Crashed);
        assert!(sim.failed().unwrap());
    }

    #[test]
    fn scheduler_markers_map_to_time_limit_and_preemption() {
        let dir = tempdir().unwrap();

        for (marker, reason) in [
            ("DUE TO TIME LIMIT", Reason::TimeLimit),
            ("DUE TO PREEMPTION", Reason::Preemption),
        ] {
            let folder = dir.path().join(format!("run-{reason:?}"));
            fs::create_dir(&folder).unwrap();
            fs::write(folder.join("flash.par"), "nend=100\n").unwrap();
            fs::write(
                folder.join("slurm-1.out"),
                format!("Driver init all done\nCANCELLED {marker}\n"),
            )
            .unwrap();

            let sim = Simulation::<Flash>::open(&folder).unwrap();
            assert_eq!(sim.reason_incomplete().unwrap(), reason);
            assert!(sim.failed().unwrap());
        }
    }

    #[test]
    fn flash_ignores_foreign_scheduler_output() {
        let dir = tempdir().unwrap();
        let folder = make_flash_folder(dir.path());
        // A slurm file from some unrelated job sharing the folder
        fs::write(folder.join("slurm-7.out"), "module load gcc\n").unwrap();

        let sim = Simulation::<Flash>::open(&folder).unwrap();
        assert!(!sim.complete().unwrap());
        assert_eq!(sim.reason_incomplete().unwrap(), Reason::NotRan);
    }

    #[test]
    fn run_executes_in_the_folder_and_captures_stdout() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        sim.run(&["sh", "-c", "echo Integration complete"]).unwrap();

        // Stdout capture feeds the completion check
        assert!(sim.complete().unwrap());
    }

    #[test]
    fn run_propagates_non_zero_exit() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        let err = sim.run(&["sh", "-c", "exit 3"]).unwrap_err();
        assert!(matches!(err, Error::ExternalCommand { .. }));
    }

    #[test]
    fn restart_updates_parameters_from_newest_checkpoint() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        fs::write(folder.join("chk_0003.h5"), b"").unwrap();
        fs::write(folder.join("chk_0011.h5"), b"").unwrap();

        let mut sim = Simulation::<Cholla>::open(&folder).unwrap();
        sim.restart(&["true"]).unwrap();

        let par = ParameterFile::read(folder.join("input.txt"), Cholla::format()).unwrap();
        assert_eq!(par.get("restart").unwrap(), &ParamValue::Bool(true));
        assert_eq!(par.get("nfile").unwrap(), &ParamValue::Int(11));
    }

    #[test]
    fn checkpoints_are_enumerated_in_name_order() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());
        fs::write(folder.join("chk_0002.h5"), b"").unwrap();
        fs::write(folder.join("chk_0001.h5"), b"").unwrap();

        let sim = Simulation::<Cholla>::open(&folder).unwrap();
        let chks = sim.checkpoints::<()>();
        let numbers: Vec<_> = chks.iter().filter_map(Checkpoint::number).collect();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn restart_without_checkpoints_fails() {
        let dir = tempdir().unwrap();
        let folder = make_cholla_folder(dir.path());

        let mut sim = Simulation::<Cholla>::open(&folder).unwrap();
        let err = sim.restart(&["true"]).unwrap_err();
        assert!(matches!(err, Error::NoCheckpoints(_)));
    }
}
