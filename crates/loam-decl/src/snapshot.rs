//! Snapshots and the quarantine protocol.
//!
//! A [`Snapshot`] is the view a query reads the world through. Two flavors:
//!
//! - [`Snapshot::shared`]: reads and writes go to the process-wide store, and
//!   entries are invisible, so computations only ever see disk. Used by queries
//!   that must not observe unsaved content (document symbol reads only entry
//!   syntax; completion-resolve reads only shared folded decls).
//! - [`respect_but_quarantine_unsaved_changes`]: entries shadow disk, and
//!   every cache write lands in a side store that is discarded when the call
//!   returns, so unsaved content never reaches the shared caches.
//!
//! Read routing under quarantine: the side store first, then the entries, and
//! the shared store only for values the entries cannot influence: a shallow
//! decl whose symbol is governed by an open buffer must come from that
//! buffer, and the program-wide caches (folded, linearization, TAST) are
//! bypassed whenever any entry exists, since their values depend on every
//! buffer's contents. The shared store is read-only during a quarantined call
//! because the whole daemon runs on one executor; no lock enforces it.

use std::sync::Arc;

use loam_core::{SourcePath, Span, SymbolName};
use loam_lang::{
    DefKind, FoldedClass, Linearization, ShallowClass, ShallowDecl, ShallowProvider,
    SymbolResolver, Tast,
};
use loam_naming::{ForwardNamingTable, ReverseNamingTable};
use loam_vfs::Entry;

use crate::context::Context;
use crate::store::DeclStore;

/// Borrowed access to the naming tables for the duration of one query.
#[derive(Clone, Copy)]
pub struct NamingView<'a> {
    pub fnt: &'a ForwardNamingTable,
    pub rnt: &'a ReverseNamingTable,
}

pub struct Snapshot<'a> {
    ctx: &'a Context,
    naming: NamingView<'a>,
    quarantine: Option<DeclStore>,
}

/// How the open buffers bear on a symbol.
enum EntryRuling {
    /// Some entry defines the symbol.
    Defined(ShallowDecl),
    /// The reverse table places the symbol in a file whose open buffer no
    /// longer defines it; the buffer shadows disk.
    Shadowed,
    /// No entry has a say; disk is authoritative.
    NotGoverned,
}

/// Run `f` against a view that sees entry (unsaved) content without letting
/// any computation derived from it persist in the shared caches.
pub fn respect_but_quarantine_unsaved_changes<'a, R>(
    ctx: &'a Context,
    naming: NamingView<'a>,
    f: impl FnOnce(&Snapshot<'a>) -> R,
) -> R {
    let snapshot = Snapshot {
        ctx,
        naming,
        quarantine: Some(DeclStore::default()),
    };
    // The side store drops with the snapshot; nothing computed inside leaks.
    f(&snapshot)
}

impl<'a> Snapshot<'a> {
    pub fn shared(ctx: &'a Context, naming: NamingView<'a>) -> Self {
        Self {
            ctx,
            naming,
            quarantine: None,
        }
    }

    pub fn ctx(&self) -> &Context {
        self.ctx
    }

    pub fn entry(&self, path: &SourcePath) -> Option<&Arc<Entry>> {
        self.ctx.entry(path)
    }

    fn sees_entries(&self) -> bool {
        self.quarantine.is_some()
    }

    fn write_store(&self) -> &DeclStore {
        match &self.quarantine {
            Some(side) => side,
            None => self.ctx.store(),
        }
    }

    /// Whether the program-wide caches (folded, linearization, TAST) in the
    /// shared store are exact for this view. With any entry open they may
    /// disagree with what the buffers say, so a quarantined snapshot computes
    /// its own through the side store instead.
    fn shared_derived_usable(&self) -> bool {
        self.quarantine.is_none() || self.ctx.entries().is_empty()
    }

    fn entry_ruling(&self, name: &SymbolName) -> EntryRuling {
        for entry in self.ctx.entries().iter() {
            if let Some(decl) = decl_in_ast(&entry.ast(), name) {
                return EntryRuling::Defined(decl);
            }
        }
        match self.naming.rnt.get(name) {
            Some(path) if self.ctx.entries().contains(path) => EntryRuling::Shadowed,
            _ => EntryRuling::NotGoverned,
        }
    }

    /// The shallow declaration of `name`, computed on demand.
    ///
    /// Under quarantine, entries shadow the naming tables: a symbol defined in
    /// an open buffer resolves there, and a symbol the reverse table places in
    /// a file with an open buffer is governed by that buffer's contents.
    pub fn shallow_decl(&self, name: &SymbolName) -> Option<Arc<ShallowDecl>> {
        if let Some(side) = &self.quarantine {
            if let Some(found) = side.shallow(name) {
                return Some(found);
            }
            match self.entry_ruling(name) {
                EntryRuling::Defined(decl) => {
                    let decl = Arc::new(decl);
                    side.insert_shallow(name.clone(), decl.clone());
                    return Some(decl);
                }
                EntryRuling::Shadowed => return None,
                EntryRuling::NotGoverned => {}
            }
        }

        if let Some(found) = self.ctx.store().shallow(name) {
            return Some(found);
        }
        let computed = Arc::new(self.disk_shallow(name)?);
        self.write_store()
            .insert_shallow(name.clone(), computed.clone());
        Some(computed)
    }

    fn disk_shallow(&self, name: &SymbolName) -> Option<ShallowDecl> {
        let path = self.naming.rnt.get(name)?;
        let text = self.ctx.fs().read_to_string(path).ok()?;
        decl_in_ast(&loam_lang::parse(&text), name)
    }

    pub fn folded_class(&self, name: &SymbolName) -> Option<Arc<FoldedClass>> {
        if let Some(side) = &self.quarantine {
            if let Some(found) = side.folded(name) {
                return Some(found);
            }
        }
        if self.shared_derived_usable() {
            if let Some(found) = self.ctx.store().folded(name) {
                return Some(found);
            }
        }

        let folded = Arc::new(loam_lang::fold_class(name, self)?);
        self.write_store().insert_folded(name.clone(), folded.clone());
        Some(folded)
    }

    pub fn linearization(&self, name: &SymbolName) -> Option<Arc<Linearization>> {
        if let Some(side) = &self.quarantine {
            if let Some(found) = side.linearization(name) {
                return Some(found);
            }
        }
        if self.shared_derived_usable() {
            if let Some(found) = self.ctx.store().linearization(name) {
                return Some(found);
            }
        }

        let lin = Arc::new(loam_lang::linearize(name, self)?);
        self.write_store()
            .insert_linearization(name.clone(), lin.clone());
        Some(lin)
    }

    /// The typed AST of an entry, computed on demand against this view.
    pub fn tast(&self, entry: &Entry) -> Arc<Tast> {
        if let Some(side) = &self.quarantine {
            if let Some(found) = side.tast(entry.path()) {
                return found;
            }
        }
        if self.shared_derived_usable() {
            if let Some(found) = self.ctx.store().tast(entry.path()) {
                return found;
            }
        }

        let tast = Arc::new(loam_lang::infer(&entry.ast(), self));
        self.write_store()
            .insert_tast(entry.path().clone(), tast.clone());
        tast
    }

    /// Where `name` is defined: the defining path and the name span.
    pub fn def_location(&self, name: &SymbolName) -> Option<(SourcePath, Span)> {
        if self.sees_entries() {
            for entry in self.ctx.entries().iter() {
                if let Some(def) = entry.ast().def(name.as_str()) {
                    return Some((entry.path().clone(), def.span));
                }
            }
        }

        let path = self.naming.rnt.get(name)?.clone();
        if self.sees_entries() && self.ctx.entries().contains(&path) {
            return None;
        }
        let text = self.ctx.fs().read_to_string(&path).ok()?;
        let ast = loam_lang::parse(&text);
        let def = ast.def(name.as_str())?;
        Some((path, def.span))
    }
}

fn decl_in_ast(ast: &loam_lang::Ast, name: &SymbolName) -> Option<ShallowDecl> {
    loam_lang::shallow_decls(ast)
        .into_iter()
        .find(|(decl_name, _)| decl_name == name)
        .map(|(_, decl)| decl)
}

impl ShallowProvider for Snapshot<'_> {
    fn shallow_class(&self, name: &SymbolName) -> Option<Arc<ShallowClass>> {
        match &*self.shallow_decl(name)? {
            ShallowDecl::Class(class) => Some(Arc::new(class.clone())),
            _ => None,
        }
    }
}

impl SymbolResolver for Snapshot<'_> {
    fn kind_of(&self, name: &SymbolName) -> Option<DefKind> {
        self.shallow_decl(name).map(|decl| decl.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgramOptions;
    use loam_naming::{FileInfo, NamingIndex};
    use loam_vfs::MemoryFs;
    use pretty_assertions::assert_eq;

    fn world() -> (Arc<DeclStore>, ForwardNamingTable, ReverseNamingTable, Context) {
        let fs = Arc::new(MemoryFs::new());
        fs.write(SourcePath::repo("a.lm"), "class A {\n    method m()\n}\n");

        let index = NamingIndex::from_files([(
            SourcePath::repo("a.lm"),
            FileInfo {
                classes: vec![SymbolName::from("A")],
                ..FileInfo::default()
            },
        )]);
        let store = Arc::new(DeclStore::default());
        let ctx = Context::new(ProgramOptions::default(), store.clone(), fs);
        (
            store,
            ForwardNamingTable::from_index(&index),
            ReverseNamingTable::from_index(&index),
            ctx,
        )
    }

    #[test]
    fn quarantined_reads_ignore_stale_shared_decls_for_entry_files() {
        let (store, fnt, rnt, ctx) = world();
        let naming = NamingView {
            fnt: &fnt,
            rnt: &rnt,
        };

        let ctx = ctx.with_entry(Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "class A extends Missing {\n}\n".to_string(),
        )));

        // A shared-mode query repopulates the shared cache from disk while
        // the buffer is open.
        Snapshot::shared(&ctx, naming)
            .shallow_decl(&SymbolName::from("A"))
            .unwrap();
        assert_eq!(store.shallow_len(), 1);

        // The quarantined view must still be governed by the buffer.
        let signature = respect_but_quarantine_unsaved_changes(&ctx, naming, |snap| {
            snap.shallow_decl(&SymbolName::from("A")).unwrap().signature()
        });
        assert_eq!(signature, "class A extends Missing");
    }

    #[test]
    fn quarantined_folding_bypasses_shared_derived_caches_when_entries_exist() {
        let (store, fnt, rnt, ctx) = world();
        let naming = NamingView {
            fnt: &fnt,
            rnt: &rnt,
        };

        // Disk view of A folds with one method.
        let disk_folded = {
            let snap = Snapshot::shared(&ctx, naming);
            snap.folded_class(&SymbolName::from("A")).unwrap()
        };
        assert_eq!(disk_folded.members.len(), 1);
        assert_eq!(store.folded_len(), 1);

        // The buffer drops the method; the quarantined fold must see that
        // even though the shared cache still holds the disk version.
        let ctx = ctx.with_entry(Arc::new(Entry::new(
            SourcePath::repo("a.lm"),
            "class A {\n}\n".to_string(),
        )));
        let folded = respect_but_quarantine_unsaved_changes(&ctx, naming, |snap| {
            snap.folded_class(&SymbolName::from("A")).unwrap()
        });
        assert_eq!(folded.members.len(), 0);
    }
}
