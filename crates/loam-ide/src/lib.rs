//! The language-service queries.
//!
//! Every function here takes the [`Snapshot`](loam_decl::Snapshot) the daemon
//! hands it and returns a plain result struct; nothing reaches around the
//! snapshot to touch daemon state. Which queries run under quarantine is the
//! daemon's call, not theirs.

mod completion;
mod coverage;
mod document_symbol;
mod highlight;
mod hover;
mod navigation;
mod signature_help;

use loam_core::{SourcePath, Span};
use serde::{Deserialize, Serialize};

pub use completion::{
    completion, completion_resolve, completion_resolve_location, CompletionItem, ResolvedCompletion,
};
pub use coverage::{type_coverage, TypeCoverageResult};
pub use document_symbol::{document_symbol, DocumentSymbol, SymbolKind};
pub use highlight::document_highlight;
pub use hover::{hover, HoverInfo};
pub use navigation::{definition, type_definition};
pub use signature_help::{signature_help, SignatureHelp};

/// A definition site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: SourcePath,
    pub span: Span,
}
