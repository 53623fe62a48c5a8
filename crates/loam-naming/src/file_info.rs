//! Per-file symbol summary.

use loam_core::SymbolName;
use loam_lang::{Ast, DefKind};
use serde::{Deserialize, Serialize};

/// The symbols a file defines, enough to rebuild the reverse index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub classes: Vec<SymbolName>,
    pub funs: Vec<SymbolName>,
    pub consts: Vec<SymbolName>,
}

impl FileInfo {
    pub fn from_ast(ast: &Ast) -> Self {
        let mut info = FileInfo::default();
        for def in &ast.defs {
            match def.kind {
                DefKind::Class => info.classes.push(def.name.clone()),
                DefKind::Fun => info.funs.push(def.name.clone()),
                DefKind::Const => info.consts.push(def.name.clone()),
            }
        }
        info
    }

    pub fn symbols(&self) -> impl Iterator<Item = &SymbolName> {
        self.classes
            .iter()
            .chain(self.funs.iter())
            .chain(self.consts.iter())
    }

    pub fn symbols_with_kinds(&self) -> impl Iterator<Item = (&SymbolName, DefKind)> {
        self.classes
            .iter()
            .map(|n| (n, DefKind::Class))
            .chain(self.funs.iter().map(|n| (n, DefKind::Fun)))
            .chain(self.consts.iter().map(|n| (n, DefKind::Const)))
    }

    pub fn contains(&self, name: &SymbolName) -> bool {
        self.symbols().any(|s| s == name)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.funs.is_empty() && self.consts.is_empty()
    }
}
