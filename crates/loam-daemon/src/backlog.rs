//! The change-backlog processor.
//!
//! One path per turn, dequeued in whatever order the set yields. The loop
//! only calls this when no request is waiting, so interactive latency wins
//! over freshness. A failure on one path is logged and the path dropped:
//! one unreadable file must not stall the daemon forever.

use std::panic::AssertUnwindSafe;

use loam_decl::process_disk_change;

use crate::protocol::Notification;
use crate::state::InitializedState;

/// Process one queued path. Returns the status notifications to emit.
pub fn process_one_changed_file(state: &mut InitializedState) -> Vec<Notification> {
    let Some(path) = state.changed_files.iter().next().cloned() else {
        return Vec::new();
    };
    state.changed_files.remove(&path);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        process_disk_change(
            state.ctx.store(),
            &mut state.fnt,
            &mut state.rnt,
            &**state.ctx.fs(),
            &path,
        )
    }));
    match outcome {
        Ok(Ok(Some(change))) => {
            state
                .symbol_index
                .apply_delta(change.old_info.as_ref(), change.new_info.as_ref());
        }
        Ok(Ok(None)) => {
            // Not a source file; still counted for progress.
        }
        Ok(Err(err)) => {
            tracing::warn!(
                target = "loam.daemon",
                %path,
                error = %err,
                "failed to process changed file; dropping it"
            );
        }
        Err(_) => {
            tracing::error!(
                target = "loam.daemon",
                %path,
                "panic while processing changed file; dropping it"
            );
        }
    }

    let total = state.changed_files_denominator;
    let processed = total - state.changed_files.len();
    let mut notifications = vec![Notification::Processing { processed, total }];
    if state.changed_files.is_empty() {
        notifications.push(Notification::Done);
        state.changed_files_denominator = 0;
    }
    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::{PathResolver, SourcePath, SymbolName};
    use loam_decl::{Context, DeclStore, ProgramOptions};
    use loam_index::SymbolIndexEnv;
    use loam_naming::{ForwardNamingTable, NamingIndex, ReverseNamingTable};
    use loam_vfs::{LocalFs, SharedResolver};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn state_with_backlog(paths: &[SourcePath]) -> (InitializedState, tempfile::TempDir) {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("a.lm"), "fun alpha()\n").unwrap();
        std::fs::write(repo.path().join("b.lm"), "class Beta {\n}\n").unwrap();

        let stdlib_stubs = crate::stubs::materialize_stubs().unwrap();
        let resolver = SharedResolver::new(PathResolver::new(
            repo.path(),
            stdlib_stubs.path(),
            std::env::temp_dir(),
        ));
        let store = Arc::new(DeclStore::default());
        let ctx = Context::new(
            ProgramOptions::default(),
            store,
            Arc::new(LocalFs::new(resolver.clone())),
        );
        let state = InitializedState {
            stdlib_stubs,
            resolver,
            fnt: ForwardNamingTable::default(),
            rnt: ReverseNamingTable::from_index(&NamingIndex::default()),
            symbol_index: SymbolIndexEnv::default(),
            ctx,
            changed_files: paths.iter().cloned().collect::<HashSet<_>>(),
            changed_files_denominator: paths.len(),
        };
        (state, repo)
    }

    #[test]
    fn progress_is_monotone_and_done_resets_the_denominator() {
        let (mut state, _repo) =
            state_with_backlog(&[SourcePath::repo("a.lm"), SourcePath::repo("b.lm")]);

        let first = process_one_changed_file(&mut state);
        assert_eq!(
            first,
            vec![Notification::Processing {
                processed: 1,
                total: 2
            }]
        );

        let second = process_one_changed_file(&mut state);
        assert_eq!(
            second,
            vec![
                Notification::Processing {
                    processed: 2,
                    total: 2
                },
                Notification::Done
            ]
        );
        assert_eq!(state.changed_files_denominator, 0);

        // Both files made it into the naming tables.
        assert!(state.rnt.get(&SymbolName::from("alpha")).is_some());
        assert!(state.rnt.get(&SymbolName::from("Beta")).is_some());
        assert_eq!(state.symbol_index.len(), 2);
    }

    #[test]
    fn unreadable_paths_are_dropped_but_still_counted() {
        let (mut state, _repo) = state_with_backlog(&[SourcePath::repo("missing.lm")]);
        let notes = process_one_changed_file(&mut state);
        assert_eq!(
            notes,
            vec![
                Notification::Processing {
                    processed: 1,
                    total: 1
                },
                Notification::Done
            ]
        );
        assert!(state.changed_files.is_empty());
    }

    #[test]
    fn non_source_paths_count_for_progress_only() {
        let (mut state, _repo) = state_with_backlog(&[SourcePath::repo("notes.txt")]);
        let notes = process_one_changed_file(&mut state);
        assert_eq!(notes.len(), 2);
        assert!(state.fnt.is_empty());
        assert_eq!(state.symbol_index.len(), 0);
    }

    #[test]
    fn empty_backlog_is_a_no_op() {
        let (mut state, _repo) = state_with_backlog(&[]);
        assert!(process_one_changed_file(&mut state).is_empty());
    }
}
