//! The process-wide declaration caches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use loam_core::{SourcePath, SymbolName};
use loam_lang::{FoldedClass, Linearization, ShallowDecl, Tast};

/// Shallow / folded / linearization / TAST caches.
///
/// There is one logical owner per process; read views share it behind `Arc`.
/// All mutation happens on the single executor, so the mutexes are never
/// contended; they exist to keep the store `Sync` for the runtime.
#[derive(Debug, Default)]
pub struct DeclStore {
    shallow: Mutex<HashMap<SymbolName, Arc<ShallowDecl>>>,
    folded: Mutex<HashMap<SymbolName, Arc<FoldedClass>>>,
    linearizations: Mutex<HashMap<SymbolName, Arc<Linearization>>>,
    tasts: Mutex<HashMap<SourcePath, Arc<Tast>>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target = "loam.decl",
                cache = what,
                "mutex poisoned; continuing with recovered guard"
            );
            poisoned.into_inner()
        }
    }
}

impl DeclStore {
    pub fn shallow(&self, name: &SymbolName) -> Option<Arc<ShallowDecl>> {
        lock(&self.shallow, "shallow").get(name).cloned()
    }

    pub fn insert_shallow(&self, name: SymbolName, decl: Arc<ShallowDecl>) {
        lock(&self.shallow, "shallow").insert(name, decl);
    }

    pub fn remove_shallow(&self, name: &SymbolName) {
        lock(&self.shallow, "shallow").remove(name);
    }

    pub fn folded(&self, name: &SymbolName) -> Option<Arc<FoldedClass>> {
        lock(&self.folded, "folded").get(name).cloned()
    }

    pub fn insert_folded(&self, name: SymbolName, class: Arc<FoldedClass>) {
        lock(&self.folded, "folded").insert(name, class);
    }

    pub fn linearization(&self, name: &SymbolName) -> Option<Arc<Linearization>> {
        lock(&self.linearizations, "linearizations").get(name).cloned()
    }

    pub fn insert_linearization(&self, name: SymbolName, lin: Arc<Linearization>) {
        lock(&self.linearizations, "linearizations").insert(name, lin);
    }

    pub fn tast(&self, path: &SourcePath) -> Option<Arc<Tast>> {
        lock(&self.tasts, "tasts").get(path).cloned()
    }

    pub fn insert_tast(&self, path: SourcePath, tast: Arc<Tast>) {
        lock(&self.tasts, "tasts").insert(path, tast);
    }

    /// Drop every cache that depends on the whole program: folded decls,
    /// linearizations and typed ASTs.
    pub fn clear_derived(&self) {
        lock(&self.folded, "folded").clear();
        lock(&self.linearizations, "linearizations").clear();
        lock(&self.tasts, "tasts").clear();
    }

    pub fn shallow_len(&self) -> usize {
        lock(&self.shallow, "shallow").len()
    }

    pub fn folded_len(&self) -> usize {
        lock(&self.folded, "folded").len()
    }

    pub fn linearization_len(&self) -> usize {
        lock(&self.linearizations, "linearizations").len()
    }

    pub fn tast_len(&self) -> usize {
        lock(&self.tasts, "tasts").len()
    }
}
