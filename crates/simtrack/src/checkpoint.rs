//! Numbered checkpoint artifacts.
//!
//! A checkpoint is a snapshot file whose sequence number is embedded as a
//! trailing numeric run in the file stem. Opening the payload is delegated
//! to an external analysis library behind [`DatasetOpener`] and memoized,
//! since those loads are expensive (HDF5 parsing, grid reconstruction).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::Result;

/// Opens a checkpoint payload into an opaque dataset handle.
///
/// This crate never interprets payload contents; the opener is supplied by
/// whatever analysis library the caller uses.
pub trait DatasetOpener {
    type Dataset;

    fn open(&self, path: &Path) -> Result<Self::Dataset>;
}

/// One checkpoint file of a simulation.
#[derive(Debug)]
pub struct Checkpoint<D = ()> {
    path: PathBuf,
    dataset: OnceLock<D>,
}

impl<D> Checkpoint<D> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dataset: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number parsed from the trailing digits of the file stem,
    /// `None` when the name carries no number.
    pub fn number(&self) -> Option<u64> {
        trailing_number(&self.path)
    }

    /// Open the payload, at most once for this instance.
    ///
    /// Later calls return the memoized handle without touching the opener.
    /// The first successful open wins.
    pub fn dataset<O>(&self, opener: &O) -> Result<&D>
    where
        O: DatasetOpener<Dataset = D>,
    {
        if let Some(dataset) = self.dataset.get() {
            return Ok(dataset);
        }
        let dataset = opener.open(&self.path)?;
        Ok(self.dataset.get_or_init(|| dataset))
    }
}

/// Trailing numeric run of a path's file stem ("run_chk_0042.h5" → 42).
pub(crate) fn trailing_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits: &str = {
        let start = stem
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        &stem[start..]
    };
    digits.parse().ok()
}
