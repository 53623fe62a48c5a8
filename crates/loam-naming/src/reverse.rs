//! Reverse naming table: symbol → defining file.

use std::collections::HashMap;
use std::sync::Arc;

use loam_core::{SourcePath, SymbolName};

use crate::saved_state::NamingIndex;

/// A delta layered over the persistent index loaded from saved state.
///
/// Reflects disk only. `None` in the delta marks a symbol deleted since the
/// saved state; on conflicting redefinitions across files the last writer
/// wins.
#[derive(Debug)]
pub struct ReverseNamingTable {
    base: Arc<HashMap<SymbolName, SourcePath>>,
    delta: HashMap<SymbolName, Option<SourcePath>>,
}

impl ReverseNamingTable {
    pub fn from_index(index: &NamingIndex) -> Self {
        Self {
            base: Arc::new(index.symbol_to_file()),
            delta: HashMap::new(),
        }
    }

    pub fn get(&self, name: &SymbolName) -> Option<&SourcePath> {
        match self.delta.get(name) {
            Some(slot) => slot.as_ref(),
            None => self.base.get(name),
        }
    }

    pub fn remove_symbols<'a>(&mut self, names: impl Iterator<Item = &'a SymbolName>) {
        for name in names {
            self.delta.insert(name.clone(), None);
        }
    }

    pub fn add_symbols<'a>(
        &mut self,
        names: impl Iterator<Item = &'a SymbolName>,
        path: &SourcePath,
    ) {
        for name in names {
            self.delta.insert(name.clone(), Some(path.clone()));
        }
    }

    #[cfg(test)]
    pub fn delta_len(&self) -> usize {
        self.delta.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_info::FileInfo;
    use pretty_assertions::assert_eq;

    fn index_with(path: &SourcePath, fun: &str) -> NamingIndex {
        NamingIndex::from_files([(
            path.clone(),
            FileInfo {
                funs: vec![SymbolName::from(fun)],
                ..FileInfo::default()
            },
        )])
    }

    #[test]
    fn delta_shadows_base() {
        let a = SourcePath::repo("a.lm");
        let b = SourcePath::repo("b.lm");
        let mut rnt = ReverseNamingTable::from_index(&index_with(&a, "f"));

        let f = SymbolName::from("f");
        assert_eq!(rnt.get(&f), Some(&a));

        rnt.add_symbols([f.clone()].iter(), &b);
        assert_eq!(rnt.get(&f), Some(&b));

        rnt.remove_symbols([f.clone()].iter());
        assert_eq!(rnt.get(&f), None);
    }

    #[test]
    fn last_writer_wins_on_conflicts() {
        let a = SourcePath::repo("a.lm");
        let b = SourcePath::repo("b.lm");
        let mut rnt = ReverseNamingTable::from_index(&NamingIndex::default());

        let f = SymbolName::from("f");
        rnt.add_symbols([f.clone()].iter(), &a);
        rnt.add_symbols([f.clone()].iter(), &b);
        assert_eq!(rnt.get(&f), Some(&b));
    }
}
