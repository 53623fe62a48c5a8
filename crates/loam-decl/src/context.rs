//! The read view a query goes through.

use std::sync::Arc;

use loam_core::SourcePath;
use loam_vfs::{Entry, EntryTable, FileSystem};

use crate::store::DeclStore;

#[derive(Clone, Debug)]
pub struct ProgramOptions {
    /// Per-member invalidation requires shallow class decls; the daemon turns
    /// this on at initialize time.
    pub shallow_class_decls: bool,
    pub ranked_autocomplete: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            shallow_class_decls: true,
            ranked_autocomplete: false,
        }
    }
}

/// Program options, the cache store and the entry table.
///
/// Cheap to derive; mutating a context means producing a new one
/// ([`Context::with_entry`], [`Context::without_entry`]).
#[derive(Clone)]
pub struct Context {
    opts: Arc<ProgramOptions>,
    store: Arc<DeclStore>,
    entries: EntryTable,
    fs: Arc<dyn FileSystem>,
}

impl Context {
    pub fn new(opts: ProgramOptions, store: Arc<DeclStore>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            opts: Arc::new(opts),
            store,
            entries: EntryTable::default(),
            fs,
        }
    }

    pub fn opts(&self) -> &ProgramOptions {
        &self.opts
    }

    pub fn store(&self) -> &Arc<DeclStore> {
        &self.store
    }

    pub fn entries(&self) -> &EntryTable {
        &self.entries
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn entry(&self, path: &SourcePath) -> Option<&Arc<Entry>> {
        self.entries.get(path)
    }

    pub fn with_entry(&self, entry: Arc<Entry>) -> Context {
        let mut derived = self.clone();
        derived.entries.insert(entry);
        derived
    }

    pub fn without_entry(&self, path: &SourcePath) -> Context {
        let mut derived = self.clone();
        derived.entries.remove(path);
        derived
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("opts", &self.opts)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
