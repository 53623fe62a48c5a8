//! Document symbol: the outline of a single file.
//!
//! Reads only the entry's own syntax; never needs the naming tables or the
//! declaration caches.

use loam_core::Span;
use loam_lang::{DefKind, MemberKind};
use loam_vfs::Entry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Fun,
    Const,
    Method,
    Prop,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub children: Vec<DocumentSymbol>,
}

pub fn document_symbol(entry: &Entry) -> Vec<DocumentSymbol> {
    entry
        .ast()
        .defs
        .iter()
        .map(|def| DocumentSymbol {
            name: def.name.to_string(),
            kind: match def.kind {
                DefKind::Class => SymbolKind::Class,
                DefKind::Fun => SymbolKind::Fun,
                DefKind::Const => SymbolKind::Const,
            },
            span: def.span,
            children: def
                .members
                .iter()
                .map(|member| DocumentSymbol {
                    name: member.name.to_string(),
                    kind: match member.kind {
                        MemberKind::Method => SymbolKind::Method,
                        MemberKind::Prop => SymbolKind::Prop,
                    },
                    span: member.span,
                    children: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::SourcePath;
    use pretty_assertions::assert_eq;

    #[test]
    fn outline_nests_members_under_their_class() {
        let entry = Entry::new(
            SourcePath::repo("a.lm"),
            "class A {\n    method m()\n    prop p\n}\nfun f()\n".to_string(),
        );
        let outline = document_symbol(&entry);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].name, "A");
        assert_eq!(outline[0].children.len(), 2);
        assert_eq!(outline[0].children[1].kind, SymbolKind::Prop);
        assert_eq!(outline[1].kind, SymbolKind::Fun);
    }
}
