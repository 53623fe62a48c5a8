//! Type coverage: which identifier occurrences resolved.

use loam_core::Span;
use loam_decl::Snapshot;
use loam_vfs::Entry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCoverageResult {
    pub covered: Vec<Span>,
    pub uncovered: Vec<Span>,
    pub percent: u32,
}

pub fn type_coverage(snap: &Snapshot<'_>, entry: &Entry) -> TypeCoverageResult {
    let tast = snap.tast(entry);
    TypeCoverageResult {
        covered: tast.typed.iter().map(|t| t.span).collect(),
        uncovered: tast.untyped.clone(),
        percent: tast.coverage_percent(),
    }
}
