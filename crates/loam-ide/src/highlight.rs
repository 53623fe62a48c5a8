//! Document highlight: every occurrence of the word under the cursor.

use loam_core::{LineCol, Span};
use loam_vfs::Entry;

pub fn document_highlight(entry: &Entry, pos: LineCol) -> Vec<Span> {
    let offset = entry.offset(pos);
    let ast = entry.ast();
    let Some(word) = ast.word_at(offset) else {
        return Vec::new();
    };
    ast.words
        .iter()
        .filter(|other| other.text == word.text)
        .map(|other| other.span)
        .collect()
}
