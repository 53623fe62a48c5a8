//! Saved-state blobs: the persistent naming index plus the list of files
//! that changed since the blob was produced.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use bincode::Options;
use loam_core::{SourcePath, SymbolName};
use serde::{Deserialize, Serialize};

use crate::file_info::FileInfo;

const BLOB_SCHEMA_VERSION: u32 = 1;

fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// The persistent symbol index a saved state carries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingIndex {
    files: BTreeMap<SourcePath, FileInfo>,
}

impl NamingIndex {
    pub fn from_files(files: impl IntoIterator<Item = (SourcePath, FileInfo)>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }

    pub fn files(&self) -> impl Iterator<Item = (&SourcePath, &FileInfo)> {
        self.files.iter()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Materialize the reverse direction. Later files win on conflicts,
    /// matching the reverse table's overwrite discipline.
    pub fn symbol_to_file(&self) -> HashMap<SymbolName, SourcePath> {
        let mut map = HashMap::new();
        for (path, info) in &self.files {
            for symbol in info.symbols() {
                map.insert(symbol.clone(), path.clone());
            }
        }
        map
    }
}

#[derive(Serialize, Deserialize)]
struct SavedStateBlob {
    schema_version: u32,
    index: NamingIndex,
    changed_files: Vec<SourcePath>,
}

/// What a loader yields: the index and the files that changed since it was
/// produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedState {
    pub index: NamingIndex,
    pub changed_files: Vec<SourcePath>,
}

/// A saved-state load failure, structured for end-user display.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{short}")]
pub struct LoadError {
    /// One-line summary, e.g. for a status bar.
    pub short: String,
    /// A sentence or two for a notification popup.
    pub medium: String,
    /// Full prose for a log or troubleshooting page.
    pub long: String,
    pub debug: String,
    /// Whether the user can plausibly fix this themselves.
    pub is_actionable: bool,
}

impl LoadError {
    fn not_found(path: &Path) -> Self {
        Self {
            short: "saved state not found".to_string(),
            medium: format!("No saved state at {}.", path.display()),
            long: format!(
                "The daemon could not find a saved naming index at {}. Rebuild the saved \
                 state or point the daemon at an existing one.",
                path.display()
            ),
            debug: format!("missing blob: {}", path.display()),
            is_actionable: true,
        }
    }

    fn unreadable(path: &Path, err: &std::io::Error) -> Self {
        Self {
            short: "saved state unreadable".to_string(),
            medium: format!("Could not read the saved state at {}.", path.display()),
            long: format!(
                "Reading the saved naming index at {} failed: {err}. Check permissions and \
                 that the file is not being written concurrently.",
                path.display()
            ),
            debug: format!("io error reading {}: {err}", path.display()),
            is_actionable: true,
        }
    }

    fn corrupt(path: &Path, detail: String) -> Self {
        Self {
            short: "saved state corrupt".to_string(),
            medium: format!("The saved state at {} could not be decoded.", path.display()),
            long: format!(
                "The saved naming index at {} is corrupt or was produced by an \
                 incompatible version. Rebuild the saved state.",
                path.display()
            ),
            debug: detail,
            is_actionable: false,
        }
    }
}

pub trait SavedStateLoader: Send + Sync {
    fn load(&self) -> Result<SavedState, LoadError>;
}

/// Loads the blob from disk.
///
/// With `assume_no_changes` (an explicitly supplied saved-state path), the
/// caller asserts nothing changed since the blob was produced and the
/// recorded changed-files list is discarded.
#[derive(Debug, Clone)]
pub struct DiskSavedStateLoader {
    pub path: PathBuf,
    pub assume_no_changes: bool,
}

impl SavedStateLoader for DiskSavedStateLoader {
    fn load(&self) -> Result<SavedState, LoadError> {
        if !self.path.exists() {
            return Err(LoadError::not_found(&self.path));
        }
        let bytes = std::fs::read(&self.path)
            .map_err(|err| LoadError::unreadable(&self.path, &err))?;
        let blob: SavedStateBlob = bincode_options()
            .deserialize(&bytes)
            .map_err(|err| LoadError::corrupt(&self.path, format!("bincode: {err}")))?;
        if blob.schema_version != BLOB_SCHEMA_VERSION {
            return Err(LoadError::corrupt(
                &self.path,
                format!(
                    "schema version mismatch: expected {BLOB_SCHEMA_VERSION}, found {}",
                    blob.schema_version
                ),
            ));
        }

        tracing::info!(
            target = "loam.naming",
            files = blob.index.file_count(),
            changed = blob.changed_files.len(),
            "loaded saved state"
        );

        Ok(SavedState {
            index: blob.index,
            changed_files: if self.assume_no_changes {
                Vec::new()
            } else {
                blob.changed_files
            },
        })
    }
}

/// Write a saved-state blob. Used by the index builder and by tests.
pub fn write_saved_state(
    path: &Path,
    index: &NamingIndex,
    changed_files: &[SourcePath],
) -> std::io::Result<()> {
    let blob = SavedStateBlob {
        schema_version: BLOB_SCHEMA_VERSION,
        index: index.clone(),
        changed_files: changed_files.to_vec(),
    };
    let bytes = bincode_options()
        .serialize(&blob)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()))?;
    std::fs::write(path, bytes)
}
