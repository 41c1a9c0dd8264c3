//! Crate errors

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by parameter files, simulations and grids
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed parameter file {} (line {line}): {message}", .path.display())]
    Parse {
        path: PathBuf,
        /// 1-based line number, 0 when the whole file is unreadable
        line: usize,
        message: String,
    },

    #[error("parameter key not found: {0}")]
    KeyNotFound(String),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("job submission command exited with {status}")]
    ExternalCommand { status: ExitStatus },

    #[error("no simulation folders found under {roots:?}")]
    EmptyGrid { roots: Vec<PathBuf> },

    #[error("no parameter file at {}", .0.display())]
    MissingParameterFile(PathBuf),

    #[error("no numbered checkpoints in {}", .0.display())]
    NoCheckpoints(PathBuf),
}
