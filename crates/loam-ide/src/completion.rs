//! Completion and its two resolve flavors.

use loam_core::{LineCol, SymbolName};
use loam_decl::Snapshot;
use loam_index::SymbolIndexEnv;
use loam_lang::DefKind;
use loam_vfs::Entry;
use serde::{Deserialize, Serialize};

use crate::Location;

const MAX_CANDIDATES: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: DefKind,
    pub detail: Option<String>,
}

/// The identifier fragment immediately before the cursor.
fn prefix_at(text: &str, offset: u32) -> &str {
    let offset = (offset as usize).min(text.len());
    let bytes = text.as_bytes();
    let mut start = offset;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
        start -= 1;
    }
    &text[start..offset]
}

pub fn completion(
    snap: &Snapshot<'_>,
    index: &SymbolIndexEnv,
    entry: &Entry,
    pos: LineCol,
    is_manually_invoked: bool,
) -> Vec<CompletionItem> {
    let offset = entry.offset(pos);
    let prefix = prefix_at(entry.text(), offset);
    if prefix.is_empty() && !is_manually_invoked {
        return Vec::new();
    }

    let mut items: Vec<CompletionItem> = Vec::new();

    // Buffer-local definitions first: they may be unsaved and therefore
    // unknown to the symbol index.
    for def in &entry.ast().defs {
        if def.name.as_str().starts_with(prefix) && !def.span.contains(offset) {
            items.push(CompletionItem {
                label: def.name.to_string(),
                kind: def.kind,
                detail: None,
            });
        }
    }

    for candidate in index.search(prefix, MAX_CANDIDATES) {
        if items.iter().any(|item| item.label == candidate.name.as_str()) {
            continue;
        }
        items.push(CompletionItem {
            label: candidate.name.to_string(),
            kind: candidate.kind,
            detail: None,
        });
    }

    if !snap.ctx().opts().ranked_autocomplete {
        items.sort_by(|a, b| a.label.cmp(&b.label));
    }
    items.truncate(MAX_CANDIDATES);
    items
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCompletion {
    pub symbol: String,
    pub kind: DefKind,
    pub detail: String,
    pub location: Option<Location>,
}

/// Resolve a completion item by name. Reads only the shared declaration
/// caches; no entry content is involved.
pub fn completion_resolve(
    snap: &Snapshot<'_>,
    symbol: &SymbolName,
    kind: DefKind,
) -> Option<ResolvedCompletion> {
    let detail = match kind {
        DefKind::Class => {
            let folded = snap.folded_class(symbol)?;
            let mut detail = format!("class {}", folded.name);
            if folded.linearization.len() > 1 {
                detail.push_str(&format!(
                    " extends {}",
                    folded.linearization[1..]
                        .iter()
                        .map(|n| n.as_str())
                        .collect::<Vec<_>>()
                        .join(" extends ")
                ));
            }
            detail.push_str(&format!(" ({} members)", folded.members.len()));
            detail
        }
        DefKind::Fun | DefKind::Const => snap.shallow_decl(symbol)?.signature(),
    };

    let location = snap
        .def_location(symbol)
        .map(|(path, span)| Location { path, span });

    Some(ResolvedCompletion {
        symbol: symbol.to_string(),
        kind,
        detail,
        location,
    })
}

/// Resolve a completion item by document position, respecting unsaved
/// content.
pub fn completion_resolve_location(
    snap: &Snapshot<'_>,
    entry: &Entry,
    pos: LineCol,
    kind: DefKind,
) -> Option<ResolvedCompletion> {
    let offset = entry.offset(pos);
    let ast = entry.ast();
    let word = ast.word_at(offset)?;
    completion_resolve(snap, &word.text, kind)
}
