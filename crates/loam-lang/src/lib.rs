//! The pure language functions the daemon orchestrates.
//!
//! Everything in this crate is a deterministic function of its inputs: parsing
//! source text to an [`Ast`], extracting per-symbol [`ShallowDecl`]s, folding
//! classes through their inheritance chain, and inferring a [`Tast`]. Cache
//! coherence is entirely the caller's problem; nothing here does I/O or keeps
//! state.

mod ast;
mod fold;
mod shallow;
mod typecheck;

pub use ast::{parse, Ast, Def, DefKind, Member, MemberKind, Word};
pub use fold::{fold_class, linearize, FoldedClass, FoldedMember, Linearization, ShallowProvider};
pub use shallow::{
    shallow_decls, ShallowClass, ShallowConst, ShallowDecl, ShallowFun, ShallowMethod,
};
pub use typecheck::{infer, SymbolResolver, Tast, TypedSpan};
