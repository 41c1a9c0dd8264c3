//! Simulation grids: discovery and bulk queries over run folders.
//!
//! A grid is nothing but a list of search roots. Every query re-scans the
//! filesystem, so results always reflect its current state; that trades
//! repeated I/O for never serving stale status, which is the right default
//! on shared scratch filesystems where jobs finish behind your back.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::debug;
use walkdir::WalkDir;

use crate::code::SimCode;
use crate::error::{Error, Result};
use crate::simulation::Simulation;
use crate::value::ParamValue;

/// A queryable collection of simulations under one or more search roots.
#[derive(Debug)]
pub struct SimulationGrid<C: SimCode> {
    roots: Vec<PathBuf>,
    _code: PhantomData<C>,
}

impl<C: SimCode> SimulationGrid<C> {
    /// Build a grid over a single search root.
    ///
    /// # Errors
    /// [`Error::EmptyGrid`] when no simulation folder exists under the
    /// root; a grid must never be vacuous.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::from_roots([root.into()])
    }

    /// Build a grid over several search roots.
    pub fn from_roots<I, P>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let grid = Self {
            roots: roots.into_iter().map(Into::into).collect(),
            _code: PhantomData,
        };
        let paths = grid.sim_paths()?;
        if paths.is_empty() {
            return Err(Error::EmptyGrid {
                roots: grid.roots.clone(),
            });
        }
        debug!(code = C::NAME, count = paths.len(), "grid constructed");
        Ok(grid)
    }

    /// The search roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Simulation folders under the roots, in traversal order (each root
    /// first, then its subdirectories depth-first). Folders reachable from
    /// overlapping roots appear once, at their first occurrence.
    ///
    /// # Errors
    /// [`Error::Io`] when a directory cannot be read during the walk.
    pub fn sim_paths(&self) -> Result<Vec<PathBuf>> {
        let mut found: IndexSet<PathBuf> = IndexSet::new();
        for root in &self.roots {
            for entry in WalkDir::new(root) {
                let entry = entry.map_err(|e| {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    Error::Io {
                        path,
                        source: e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk cycle")),
                    }
                })?;
                if entry.file_type().is_dir() && C::is_sim_folder(entry.path()) {
                    found.insert(entry.path().to_path_buf());
                }
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Fresh `Simulation` instances for every discovered folder.
    ///
    /// Recomputed on every call; nothing is cached.
    pub fn sims(&self) -> Result<Vec<Simulation<C>>> {
        self.sim_paths()?
            .into_iter()
            .map(Simulation::open)
            .collect()
    }

    /// Number of simulations currently under the roots.
    pub fn count(&self) -> Result<usize> {
        Ok(self.sim_paths()?.len())
    }

    /// Each simulation's parameter value at `key`, aligned to [`sims`]
    /// order.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] when any simulation lacks the key.
    ///
    /// [`sims`]: SimulationGrid::sims
    pub fn values(&self, key: &str) -> Result<Vec<ParamValue>> {
        self.sims()?
            .iter()
            .map(|sim| sim.par().get(key).cloned())
            .collect()
    }

    /// Whether every simulation in the grid is complete.
    pub fn complete(&self) -> Result<bool> {
        for sim in self.sims()? {
            if !sim.complete()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Simulations that hit a definite terminal failure.
    pub fn failed_sims(&self) -> Result<Vec<Simulation<C>>> {
        self.filtered(|sim| sim.failed())
    }

    /// Simulations that are not complete (including never-ran ones).
    pub fn incomplete_sims(&self) -> Result<Vec<Simulation<C>>> {
        self.filtered(|sim| Ok(!sim.complete()?))
    }

    /// Simulations that ran to completion.
    pub fn complete_sims(&self) -> Result<Vec<Simulation<C>>> {
        self.filtered(|sim| sim.complete())
    }

    fn filtered(
        &self,
        pred: impl Fn(&Simulation<C>) -> Result<bool>,
    ) -> Result<Vec<Simulation<C>>> {
        let mut kept = Vec::new();
        for sim in self.sims()? {
            if pred(&sim)? {
                kept.push(sim);
            }
        }
        Ok(kept)
    }
}
