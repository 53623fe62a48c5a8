//! In-memory buffers held open by the editor.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use loam_core::{LineCol, LineIndex, SourcePath};
use loam_lang::Ast;

/// An editor-held buffer.
///
/// The parsed AST depends solely on `contents`, so it lives on the entry and
/// is computed at most once; an edit replaces the whole `Entry`, which is what
/// invalidates it. The typed AST depends on the rest of the program and is
/// cached elsewhere, where cross-file invalidation can reach it.
#[derive(Debug)]
pub struct Entry {
    path: SourcePath,
    contents: Arc<String>,
    line_index: LineIndex,
    ast: OnceLock<Arc<Ast>>,
}

impl Entry {
    pub fn new(path: SourcePath, contents: impl Into<Arc<String>>) -> Self {
        let contents = contents.into();
        let line_index = LineIndex::new(&contents);
        Self {
            path,
            contents,
            line_index,
            ast: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &SourcePath {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.contents
    }

    pub fn contents(&self) -> &Arc<String> {
        &self.contents
    }

    pub fn ast(&self) -> Arc<Ast> {
        self.ast
            .get_or_init(|| Arc::new(loam_lang::parse(&self.contents)))
            .clone()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn offset(&self, pos: LineCol) -> u32 {
        self.line_index.offset(pos)
    }
}

/// The set of editor-held buffers.
///
/// Cloning is cheap (entries are shared behind `Arc`), which is what lets a
/// derived read view carry the table by value.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: HashMap<SourcePath, Arc<Entry>>,
}

impl EntryTable {
    pub fn get(&self, path: &SourcePath) -> Option<&Arc<Entry>> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &SourcePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: Arc<Entry>) -> Option<Arc<Entry>> {
        self.entries.insert(entry.path().clone(), entry)
    }

    pub fn remove(&mut self, path: &SourcePath) -> Option<Arc<Entry>> {
        self.entries.remove(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ast_is_parsed_once_and_reflects_contents() {
        let entry = Entry::new(SourcePath::repo("a.lm"), "fun f()\n".to_string());
        let first = entry.ast();
        let second = entry.ast();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.defs[0].name.as_str(), "f");
    }

    #[test]
    fn table_replaces_by_path() {
        let mut table = EntryTable::default();
        let path = SourcePath::repo("a.lm");
        table.insert(Arc::new(Entry::new(path.clone(), "fun a()\n".to_string())));
        let old = table.insert(Arc::new(Entry::new(path.clone(), "fun b()\n".to_string())));
        assert_eq!(old.unwrap().text(), "fun a()\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&path).unwrap().text(), "fun b()\n");
    }
}
