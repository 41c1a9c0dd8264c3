//! Parameter file model.
//!
//! A parameter file is flat `key=value` text. Reading fully replaces the
//! in-memory mapping; writing serializes it back in insertion order so a
//! round-trip preserves the file's layout.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Error, Result};
use crate::value::{ParamFormat, ParamValue};

/// One simulation's configuration file as a typed, ordered mapping.
#[derive(Debug, Clone)]
pub struct ParameterFile {
    path: PathBuf,
    format: ParamFormat,
    params: IndexMap<String, ParamValue>,
}

impl ParameterFile {
    /// Load a parameter file from disk.
    ///
    /// # Errors
    /// [`Error::Parse`] when the file is unreadable or a non-empty line
    /// lacks the `key=value` shape.
    pub fn read(path: impl Into<PathBuf>, format: ParamFormat) -> Result<Self> {
        let mut file = Self {
            path: path.into(),
            format,
            params: IndexMap::new(),
        };
        file.reload()?;
        Ok(file)
    }

    /// Re-read the file, replacing (never merging) the current mapping.
    pub fn reload(&mut self) -> Result<()> {
        let text = fs::read_to_string(&self.path).map_err(|e| Error::Parse {
            path: self.path.clone(),
            line: 0,
            message: e.to_string(),
        })?;

        let mut params = IndexMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            // Some formats mandate a leading section header; tolerate it.
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::Parse {
                    path: self.path.clone(),
                    line: index + 1,
                    message: format!("expected key=value, got '{line}'"),
                });
            };
            params.insert(
                self.format.normalize_key(key.trim()),
                ParamValue::decode(value.trim(), &self.format),
            );
        }

        self.params = params;
        Ok(())
    }

    /// Source path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The owning code's string conventions.
    pub fn format(&self) -> &ParamFormat {
        &self.format
    }

    /// Typed value at `key`.
    ///
    /// # Errors
    /// [`Error::KeyNotFound`] when the key is absent.
    pub fn get(&self, key: &str) -> Result<&ParamValue> {
        let key = self.format.normalize_key(key);
        self.params
            .get(&key)
            .ok_or(Error::KeyNotFound(key))
    }

    /// Store a value at `key`, returning whether the key already existed.
    ///
    /// Writing a key the file did not contain is suspicious (typo, wrong
    /// code variant) but not an error: it warns and proceeds.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) -> bool {
        let key = self.format.normalize_key(key);
        let existed = self.params.contains_key(&key);
        if !existed {
            warn!(key = %key, path = %self.path.display(), "key not present in parameter file");
        }
        self.params.insert(key, value.into());
        existed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(&self.format.normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// (key, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize back to the original source path.
    pub fn write(&self) -> Result<()> {
        self.write_to(&self.path)
    }

    /// Serialize to an explicit target path.
    ///
    /// # Errors
    /// [`Error::Io`] when the target is not writable.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        for (key, value) in &self.params {
            text.push_str(key);
            text.push('=');
            text.push_str(&value.encode(&self.format));
            text.push('\n');
        }
        fs::write(path, text).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
