//! The invalidation engine: the two mutation triggers.

use std::io;

use loam_core::SourcePath;
use loam_naming::{FileInfo, ForwardNamingTable, ReverseNamingTable};
use loam_vfs::FileSystem;

use crate::store::DeclStore;

/// Trigger A: an entry was mutated (opened with new contents, edited,
/// closed).
///
/// The entry's AST is invalidated by replacing the `Entry` itself; this
/// removes the shallow decls the forward table attributes to the file and
/// clears everything that depends on the whole program. The naming tables are
/// untouched: they reflect disk, which an entry mutation cannot change.
pub fn invalidate_entry_changed(
    store: &DeclStore,
    fnt: &ForwardNamingTable,
    path: &SourcePath,
) {
    if let Some(info) = fnt.file_info(path) {
        for symbol in info.symbols() {
            store.remove_shallow(symbol);
        }
    }
    store.clear_derived();
    tracing::debug!(target = "loam.decl", %path, "entry change invalidated caches");
}

/// The naming delta of one processed disk change, for the symbol index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiskChange {
    pub old_info: Option<FileInfo>,
    pub new_info: Option<FileInfo>,
}

/// Trigger B: a file changed on disk.
///
/// Reparses the path from disk (a missing file counts as empty), swaps the
/// file's symbols in the naming tables, invalidates the shallow decls of the
/// old and new symbol sets and clears the program-wide caches. Entry ASTs are
/// untouched; they depend on buffer contents, which disk cannot alter.
///
/// Non-source paths return `Ok(None)` without touching anything; the caller
/// still counts them for progress reporting.
pub fn process_disk_change(
    store: &DeclStore,
    fnt: &mut ForwardNamingTable,
    rnt: &mut ReverseNamingTable,
    fs: &dyn FileSystem,
    path: &SourcePath,
) -> io::Result<Option<DiskChange>> {
    if !path.is_source_file() {
        return Ok(None);
    }

    let text = match fs.read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };
    let new_info = text
        .map(|text| FileInfo::from_ast(&loam_lang::parse(&text)))
        .unwrap_or_default();

    let old_info = fnt.update(path, new_info.clone());

    if let Some(old) = &old_info {
        rnt.remove_symbols(old.symbols());
        for symbol in old.symbols() {
            store.remove_shallow(symbol);
        }
    }
    rnt.add_symbols(new_info.symbols(), path);
    for symbol in new_info.symbols() {
        store.remove_shallow(symbol);
    }
    store.clear_derived();

    tracing::debug!(
        target = "loam.decl",
        %path,
        old = old_info.as_ref().map(|i| i.symbols().count()).unwrap_or(0),
        new = new_info.symbols().count(),
        "processed disk change"
    );

    Ok(Some(DiskChange {
        old_info,
        new_info: if new_info.is_empty() {
            None
        } else {
            Some(new_info)
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, ProgramOptions};
    use crate::snapshot::{respect_but_quarantine_unsaved_changes, NamingView, Snapshot};
    use loam_core::SymbolName;
    use loam_naming::NamingIndex;
    use loam_vfs::{Entry, MemoryFs};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<DeclStore>,
        fnt: ForwardNamingTable,
        rnt: ReverseNamingTable,
        fs: Arc<MemoryFs>,
        ctx: Context,
    }

    /// Two files on disk: `a.lm` defines class A and fun helper, `b.lm`
    /// defines class B extending A.
    fn fixture() -> Fixture {
        let fs = Arc::new(MemoryFs::new());
        fs.write(SourcePath::repo("a.lm"), "class A {\n    method m()\n}\nfun helper()\n");
        fs.write(SourcePath::repo("b.lm"), "class B extends A {\n}\n");

        let index = NamingIndex::from_files([
            (
                SourcePath::repo("a.lm"),
                FileInfo {
                    classes: vec![SymbolName::from("A")],
                    funs: vec![SymbolName::from("helper")],
                    ..FileInfo::default()
                },
            ),
            (
                SourcePath::repo("b.lm"),
                FileInfo {
                    classes: vec![SymbolName::from("B")],
                    ..FileInfo::default()
                },
            ),
        ]);

        let store = Arc::new(DeclStore::default());
        let ctx = Context::new(ProgramOptions::default(), store.clone(), fs.clone());
        Fixture {
            store,
            fnt: ForwardNamingTable::from_index(&index),
            rnt: ReverseNamingTable::from_index(&index),
            fs,
            ctx,
        }
    }

    #[test]
    fn quarantined_computations_do_not_persist() {
        let fx = fixture();
        let naming = NamingView {
            fnt: &fx.fnt,
            rnt: &fx.rnt,
        };

        let folded = respect_but_quarantine_unsaved_changes(&fx.ctx, naming, |snap| {
            snap.folded_class(&SymbolName::from("B"))
        })
        .unwrap();
        assert_eq!(folded.linearization.len(), 2);

        // Everything computed inside the quarantine was discarded.
        assert_eq!(fx.store.shallow_len(), 0);
        assert_eq!(fx.store.folded_len(), 0);
        assert_eq!(fx.store.tast_len(), 0);
    }

    #[test]
    fn shared_snapshot_populates_the_shared_store_and_ignores_entries() {
        let fx = fixture();
        let ctx = fx.ctx.with_entry(Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "class A {\n    method unsaved()\n}\n".to_string(),
        )));
        let naming = NamingView {
            fnt: &fx.fnt,
            rnt: &fx.rnt,
        };

        let snap = Snapshot::shared(&ctx, naming);
        let decl = snap.shallow_decl(&SymbolName::from("A")).unwrap();
        // Disk view, not the open buffer.
        assert_eq!(decl.signature(), "class A");
        assert_eq!(fx.store.shallow_len(), 1);
    }

    #[test]
    fn quarantined_snapshot_prefers_entry_content() {
        let fx = fixture();
        let ctx = fx.ctx.with_entry(Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "class A extends B {\n}\n".to_string(),
        )));
        let naming = NamingView {
            fnt: &fx.fnt,
            rnt: &fx.rnt,
        };

        let signature = respect_but_quarantine_unsaved_changes(&ctx, naming, |snap| {
            snap.shallow_decl(&SymbolName::from("A")).unwrap().signature()
        });
        assert_eq!(signature, "class A extends B");
    }

    #[test]
    fn entry_shadowing_hides_symbols_deleted_in_the_buffer() {
        let fx = fixture();
        // The buffer for a.lm no longer defines `helper`.
        let ctx = fx.ctx.with_entry(Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "class A {\n}\n".to_string(),
        )));
        let naming = NamingView {
            fnt: &fx.fnt,
            rnt: &fx.rnt,
        };

        let helper = respect_but_quarantine_unsaved_changes(&ctx, naming, |snap| {
            snap.shallow_decl(&SymbolName::from("helper"))
        });
        assert!(helper.is_none());
    }

    #[test]
    fn entry_change_invalidates_shallow_and_derived_caches() {
        let fx = fixture();
        let naming = NamingView {
            fnt: &fx.fnt,
            rnt: &fx.rnt,
        };

        // Populate the shared store through a shared snapshot.
        {
            let snap = Snapshot::shared(&fx.ctx, naming);
            snap.folded_class(&SymbolName::from("B")).unwrap();
            snap.shallow_decl(&SymbolName::from("helper")).unwrap();
        }
        assert!(fx.store.folded_len() > 0);

        invalidate_entry_changed(&fx.store, &fx.fnt, &SourcePath::repo("a.lm"));

        // a.lm's shallow decls are gone, b.lm's survive; derived caches are
        // cleared wholesale.
        assert!(fx.store.shallow(&SymbolName::from("A")).is_none());
        assert!(fx.store.shallow(&SymbolName::from("helper")).is_none());
        assert!(fx.store.shallow(&SymbolName::from("B")).is_some());
        assert_eq!(fx.store.folded_len(), 0);
        assert_eq!(fx.store.linearization_len(), 0);
        assert_eq!(fx.store.tast_len(), 0);
    }

    #[test]
    fn disk_change_swaps_naming_table_contributions() {
        let mut fx = fixture();

        // a.lm now defines C instead of A, and drops helper.
        fx.fs
            .write(SourcePath::repo("a.lm"), "class C {\n}\n".to_string());
        let change = process_disk_change(
            &fx.store,
            &mut fx.fnt,
            &mut fx.rnt,
            &*fx.fs,
            &SourcePath::repo("a.lm"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            change.old_info.unwrap().classes,
            vec![SymbolName::from("A")]
        );
        assert_eq!(fx.rnt.get(&SymbolName::from("A")), None);
        assert_eq!(fx.rnt.get(&SymbolName::from("helper")), None);
        assert_eq!(
            fx.rnt.get(&SymbolName::from("C")),
            Some(&SourcePath::repo("a.lm"))
        );
        // Contributions from other files are untouched.
        assert_eq!(
            fx.rnt.get(&SymbolName::from("B")),
            Some(&SourcePath::repo("b.lm"))
        );
    }

    #[test]
    fn deleted_file_counts_as_empty() {
        let mut fx = fixture();
        fx.fs.delete(&SourcePath::repo("a.lm"));

        let change = process_disk_change(
            &fx.store,
            &mut fx.fnt,
            &mut fx.rnt,
            &*fx.fs,
            &SourcePath::repo("a.lm"),
        )
        .unwrap()
        .unwrap();

        assert!(change.new_info.is_none());
        assert_eq!(fx.rnt.get(&SymbolName::from("A")), None);
        assert!(fx.fnt.file_info(&SourcePath::repo("a.lm")).is_none());
    }

    #[test]
    fn non_source_paths_are_ignored_entirely() {
        let mut fx = fixture();
        let outcome = process_disk_change(
            &fx.store,
            &mut fx.fnt,
            &mut fx.rnt,
            &*fx.fs,
            &SourcePath::repo("README.md"),
        )
        .unwrap();
        assert!(outcome.is_none());
        assert_eq!(fx.fnt.len(), 2);
    }

    #[test]
    fn disk_change_leaves_entry_asts_untouched() {
        let mut fx = fixture();
        let entry = Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "fun buffered()\n".to_string(),
        ));
        let ast_before = entry.ast();
        let _ctx = fx.ctx.with_entry(entry.clone());

        fx.fs.write(SourcePath::repo("a.lm"), "class D {\n}\n");
        process_disk_change(
            &fx.store,
            &mut fx.fnt,
            &mut fx.rnt,
            &*fx.fs,
            &SourcePath::repo("a.lm"),
        )
        .unwrap();

        assert!(Arc::ptr_eq(&ast_before, &entry.ast()));
    }
}
