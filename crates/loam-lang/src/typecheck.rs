//! Type inference: the typed AST.
//!
//! Every identifier occurrence that resolves to a known symbol is typed with
//! that symbol; the rest are untyped. This is the full extent of the type
//! system, which is enough for type coverage to distinguish resolved from unresolved
//! code, which is the contract the daemon needs.

use loam_core::{Span, SymbolName};
use serde::{Deserialize, Serialize};

use crate::ast::{Ast, DefKind};

/// Where symbol kinds come from during inference.
pub trait SymbolResolver {
    fn kind_of(&self, name: &SymbolName) -> Option<DefKind>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedSpan {
    pub span: Span,
    pub symbol: SymbolName,
    pub kind: DefKind,
}

/// The typed AST of a single file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tast {
    pub typed: Vec<TypedSpan>,
    pub untyped: Vec<Span>,
}

impl Tast {
    /// Covered fraction in percent, rounded down. An empty file is fully
    /// covered.
    pub fn coverage_percent(&self) -> u32 {
        let total = self.typed.len() + self.untyped.len();
        if total == 0 {
            return 100;
        }
        (self.typed.len() * 100 / total) as u32
    }
}

pub fn infer(ast: &Ast, resolver: &dyn SymbolResolver) -> Tast {
    let mut tast = Tast::default();
    for word in &ast.words {
        match resolver.kind_of(&word.text) {
            Some(kind) => tast.typed.push(TypedSpan {
                span: word.span,
                symbol: word.text.clone(),
                kind,
            }),
            None => tast.untyped.push(word.span),
        }
    }
    tast
}
