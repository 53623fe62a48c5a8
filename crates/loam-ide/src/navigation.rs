//! Go-to-definition and go-to-type-definition.

use loam_core::LineCol;
use loam_decl::Snapshot;
use loam_lang::DefKind;
use loam_vfs::Entry;

use crate::Location;

pub fn definition(snap: &Snapshot<'_>, entry: &Entry, pos: LineCol) -> Option<Location> {
    let offset = entry.offset(pos);
    let ast = entry.ast();
    let word = ast.word_at(offset)?;

    if let Some((path, span)) = snap.def_location(&word.text) {
        return Some(Location { path, span });
    }

    // A member of the enclosing class: jump to where the member was declared,
    // which may be an ancestor.
    let class = ast.def_at(offset)?;
    let folded = snap.folded_class(&class.name)?;
    let member = folded.members.get(&word.text)?;
    let (path, _) = snap.def_location(&member.origin)?;
    Some(Location {
        path,
        span: member.span,
    })
}

/// The defining class of the thing under the cursor: the class itself for a
/// class name, the declaring ancestor for a member. Functions and constants
/// have no type definition.
pub fn type_definition(snap: &Snapshot<'_>, entry: &Entry, pos: LineCol) -> Option<Location> {
    let offset = entry.offset(pos);
    let ast = entry.ast();
    let word = ast.word_at(offset)?;

    if let Some(decl) = snap.shallow_decl(&word.text) {
        if decl.kind() != DefKind::Class {
            return None;
        }
        let (path, span) = snap.def_location(&word.text)?;
        return Some(Location { path, span });
    }

    let class = ast.def_at(offset)?;
    let folded = snap.folded_class(&class.name)?;
    let member = folded.members.get(&word.text)?;
    let (path, span) = snap.def_location(&member.origin)?;
    Some(Location { path, span })
}
