//! The daemon state machine and the initialized steady state.

use std::collections::HashSet;
use std::sync::Arc;

use loam_core::SourcePath;
use loam_decl::{invalidate_entry_changed, NamingView};
use loam_index::SymbolIndexEnv;
use loam_naming::{ForwardNamingTable, ReverseNamingTable};
use loam_vfs::{Entry, SharedResolver};
use tempfile::TempDir;

use crate::error::DaemonError;
use crate::protocol::DocLoc;
use crate::stubs;

pub enum DaemonState {
    /// Waiting for `Initialize`.
    Pending,
    Initialized(Box<InitializedState>),
    /// Initialization failed; every request is answered with the failure.
    Failed(DaemonError),
}

impl DaemonState {
    pub fn describe(&self) -> &'static str {
        match self {
            DaemonState::Pending => "initializing",
            DaemonState::Initialized(_) => "initialized",
            DaemonState::Failed(_) => "failed to initialize",
        }
    }
}

/// Everything the daemon owns once initialization succeeds.
#[derive(Debug)]
pub struct InitializedState {
    /// Owns the stubs directory; dropping the state deletes it.
    pub stdlib_stubs: TempDir,
    pub resolver: SharedResolver,
    pub fnt: ForwardNamingTable,
    pub rnt: ReverseNamingTable,
    pub symbol_index: SymbolIndexEnv,
    pub ctx: loam_decl::Context,
    pub changed_files: HashSet<SourcePath>,
    /// Monotonic within one batch; resets to 0 when the set empties.
    pub changed_files_denominator: usize,
}

impl InitializedState {
    pub fn naming(&self) -> NamingView<'_> {
        NamingView {
            fnt: &self.fnt,
            rnt: &self.rnt,
        }
    }

    pub fn queue_changed_file(&mut self, path: SourcePath) {
        if self.changed_files.insert(path) {
            self.changed_files_denominator += 1;
        }
    }

    /// Re-materialize the stubs if an external cleaner removed them.
    ///
    /// Observable only through the resolver's stdlib prefix; no caches are
    /// invalidated.
    pub fn ensure_stubs(&mut self) -> Result<(), DaemonError> {
        if self.stdlib_stubs.path().exists() {
            return Ok(());
        }
        tracing::warn!(
            target = "loam.daemon",
            dir = %self.stdlib_stubs.path().display(),
            "stubs directory disappeared; re-materializing"
        );
        let fresh = stubs::materialize_stubs().map_err(|err| DaemonError::HandlerUncaught {
            debug: format!("re-materializing stubs: {err}"),
        })?;
        self.resolver.lock().set_stdlib_root(fresh.path());
        self.stdlib_stubs = fresh;
        Ok(())
    }

    /// Apply `FileOpened`. Re-opening with identical contents is a no-op.
    pub fn open_file(&mut self, path: SourcePath, contents: String) -> Result<(), DaemonError> {
        if let Some(existing) = self.ctx.entry(&path) {
            if existing.text() == contents {
                return Ok(());
            }
        }
        self.ensure_stubs()?;
        let entry = Arc::new(Entry::new(path.clone(), contents));
        self.ctx = self.ctx.with_entry(entry);
        invalidate_entry_changed(self.ctx.store(), &self.fnt, &path);
        Ok(())
    }

    /// Apply `FileClosed`. Invalidation is eager.
    pub fn close_file(&mut self, path: &SourcePath) {
        if self.ctx.entry(path).is_none() {
            return;
        }
        self.ctx = self.ctx.without_entry(path);
        invalidate_entry_changed(self.ctx.store(), &self.fnt, path);
    }

    /// The entry a query runs against.
    ///
    /// Supplied contents create or refresh an entry (identical contents
    /// short-circuit with zero invalidations). A bare path uses the existing
    /// entry if there is one and otherwise reads disk into a transient entry
    /// that is *not* retained.
    pub fn entry_for(&mut self, doc: &DocLoc) -> Result<Arc<Entry>, DaemonError> {
        match &doc.contents {
            Some(contents) => {
                if let Some(existing) = self.ctx.entry(&doc.path) {
                    if existing.text() == contents.as_str() {
                        return Ok(existing.clone());
                    }
                }
                self.ensure_stubs()?;
                let entry = Arc::new(Entry::new(doc.path.clone(), contents.clone()));
                self.ctx = self.ctx.with_entry(entry.clone());
                invalidate_entry_changed(self.ctx.store(), &self.fnt, &doc.path);
                Ok(entry)
            }
            None => {
                if let Some(existing) = self.ctx.entry(&doc.path) {
                    return Ok(existing.clone());
                }
                let text = self.ctx.fs().read_to_string(&doc.path).map_err(|err| {
                    DaemonError::HandlerUncaught {
                        debug: format!("reading {}: {err}", doc.path),
                    }
                })?;
                Ok(Arc::new(Entry::new(doc.path.clone(), text)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::{PathResolver, SymbolName};
    use loam_decl::{Context, DeclStore, ProgramOptions};
    use loam_naming::{FileInfo, NamingIndex};
    use loam_vfs::LocalFs;
    use pretty_assertions::assert_eq;

    fn test_state() -> (InitializedState, tempfile::TempDir) {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("a.lm"), "fun alpha()\n").unwrap();

        let stdlib_stubs = stubs::materialize_stubs().unwrap();
        let resolver = SharedResolver::new(PathResolver::new(
            repo.path(),
            stdlib_stubs.path(),
            std::env::temp_dir(),
        ));
        let index = NamingIndex::from_files([(
            SourcePath::repo("a.lm"),
            FileInfo {
                funs: vec![SymbolName::from("alpha")],
                ..FileInfo::default()
            },
        )]);
        let store = Arc::new(DeclStore::default());
        let ctx = Context::new(
            ProgramOptions::default(),
            store,
            Arc::new(LocalFs::new(resolver.clone())),
        );
        let state = InitializedState {
            stdlib_stubs,
            resolver,
            fnt: ForwardNamingTable::from_index(&index),
            rnt: ReverseNamingTable::from_index(&index),
            symbol_index: SymbolIndexEnv::from_naming_index(&index),
            ctx,
            changed_files: HashSet::new(),
            changed_files_denominator: 0,
        };
        (state, repo)
    }

    #[test]
    fn reopening_with_identical_contents_invalidates_nothing() {
        let (mut state, _repo) = test_state();
        state
            .open_file(SourcePath::repo("a.lm"), "fun alpha_edited()\n".to_string())
            .unwrap();

        // Populate a derived cache, then re-open with the same text.
        state.ctx.store().insert_tast(
            SourcePath::repo("a.lm"),
            Arc::new(loam_lang::Tast::default()),
        );
        state
            .open_file(SourcePath::repo("a.lm"), "fun alpha_edited()\n".to_string())
            .unwrap();
        assert_eq!(state.ctx.store().tast_len(), 1);

        // A different text does invalidate.
        state
            .open_file(SourcePath::repo("a.lm"), "fun alpha_v3()\n".to_string())
            .unwrap();
        assert_eq!(state.ctx.store().tast_len(), 0);
    }

    #[test]
    fn bare_path_query_does_not_retain_an_entry() {
        let (mut state, _repo) = test_state();
        let entry = state
            .entry_for(&DocLoc::on_disk(SourcePath::repo("a.lm")))
            .unwrap();
        assert_eq!(entry.text(), "fun alpha()\n");
        assert!(state.ctx.entries().is_empty());
    }

    #[test]
    fn bare_path_query_keeps_an_existing_entry_as_is() {
        let (mut state, _repo) = test_state();
        state
            .open_file(SourcePath::repo("a.lm"), "fun unsaved()\n".to_string())
            .unwrap();
        let entry = state
            .entry_for(&DocLoc::on_disk(SourcePath::repo("a.lm")))
            .unwrap();
        assert_eq!(entry.text(), "fun unsaved()\n");
    }

    #[test]
    fn stubs_are_rematerialized_when_deleted() {
        let (mut state, _repo) = test_state();
        let original = state.stdlib_stubs.path().to_path_buf();
        std::fs::remove_dir_all(&original).unwrap();

        state.ensure_stubs().unwrap();
        let fresh = state.stdlib_stubs.path().to_path_buf();
        assert_ne!(original, fresh);
        assert!(fresh.join("prelude.lm").exists());
        assert_eq!(
            state.resolver.lock().stdlib_root(),
            fresh.as_path()
        );
    }

    #[test]
    fn queueing_the_same_path_twice_counts_once() {
        let (mut state, _repo) = test_state();
        state.queue_changed_file(SourcePath::repo("a.lm"));
        state.queue_changed_file(SourcePath::repo("a.lm"));
        assert_eq!(state.changed_files.len(), 1);
        assert_eq!(state.changed_files_denominator, 1);
    }

    #[test]
    fn dropping_the_state_removes_the_stubs_dir() {
        let (state, _repo) = test_state();
        let stubs_dir = state.stdlib_stubs.path().to_path_buf();
        assert!(stubs_dir.exists());
        drop(state);
        assert!(!stubs_dir.exists());
    }
}
