//! Symbol index for autocomplete ranking.
//!
//! Built once from the saved-state naming index, then kept current with the
//! per-file delta the change-backlog processor produces. Candidates are found
//! by case-insensitive prefix; ranking prefers exact-case prefix matches,
//! then shorter names.

use std::collections::BTreeMap;

use loam_core::SymbolName;
use loam_lang::DefKind;
use loam_naming::{FileInfo, NamingIndex};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedSymbol {
    pub name: SymbolName,
    pub kind: DefKind,
}

/// The autocomplete candidate service.
#[derive(Debug, Default)]
pub struct SymbolIndexEnv {
    /// Keyed by the lowercased name; each bucket holds the case-preserving
    /// symbols sharing it.
    entries: BTreeMap<String, Vec<IndexedSymbol>>,
}

impl SymbolIndexEnv {
    pub fn from_naming_index(index: &NamingIndex) -> Self {
        let mut env = Self::default();
        for (_, info) in index.files() {
            env.add_file_info(info);
        }
        env
    }

    /// Apply the naming delta of one processed file change.
    pub fn apply_delta(&mut self, old: Option<&FileInfo>, new: Option<&FileInfo>) {
        if let Some(old) = old {
            for (name, _) in old.symbols_with_kinds() {
                let key = name.as_str().to_lowercase();
                if let Some(bucket) = self.entries.get_mut(&key) {
                    bucket.retain(|sym| &sym.name != name);
                    if bucket.is_empty() {
                        self.entries.remove(&key);
                    }
                }
            }
        }
        if let Some(new) = new {
            self.add_file_info(new);
        }
    }

    fn add_file_info(&mut self, info: &FileInfo) {
        for (name, kind) in info.symbols_with_kinds() {
            let bucket = self.entries.entry(name.as_str().to_lowercase()).or_default();
            // Conflicting re-definitions collapse to one candidate.
            if !bucket.iter().any(|sym| &sym.name == name) {
                bucket.push(IndexedSymbol {
                    name: name.clone(),
                    kind,
                });
            }
        }
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<IndexedSymbol> {
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let mut results: Vec<&IndexedSymbol> = self
            .entries
            .range(needle.clone()..)
            .take_while(|(key, _)| key.starts_with(&needle))
            .flat_map(|(_, bucket)| bucket.iter())
            .collect();

        results.sort_by(|a, b| {
            let a_exact = a.name.as_str().starts_with(query);
            let b_exact = b.name.as_str().starts_with(query);
            b_exact
                .cmp(&a_exact)
                .then(a.name.as_str().len().cmp(&b.name.as_str().len()))
                .then(a.name.as_str().cmp(b.name.as_str()))
        });
        results.into_iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
