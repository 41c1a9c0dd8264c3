//! Concrete simulation-code variants.

mod cholla;
mod flash;

pub use cholla::Cholla;
pub use flash::Flash;

use std::path::{Path, PathBuf};

/// Files in `folder` whose name satisfies `pred`, unsorted.
///
/// Discovery is shallow: run artifacts live directly in the run folder.
/// An unreadable folder yields no files; status queries then classify
/// conservatively instead of erroring.
pub(crate) fn files_where(folder: &Path, pred: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(&pred)
        })
        .collect()
}

/// Checkpoint files (name contains `chk`), sorted by name.
pub(crate) fn chk_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = files_where(folder, |name| name.contains("chk"));
    files.sort();
    files
}
