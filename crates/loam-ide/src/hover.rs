//! Hover: the signature of the symbol under the cursor.

use loam_core::LineCol;
use loam_decl::Snapshot;
use loam_lang::MemberKind;
use loam_vfs::Entry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverInfo {
    pub symbol: String,
    pub kind: String,
    pub signature: String,
}

pub fn hover(snap: &Snapshot<'_>, entry: &Entry, pos: LineCol) -> Option<HoverInfo> {
    let offset = entry.offset(pos);
    let ast = entry.ast();
    let word = ast.word_at(offset)?;

    // A global symbol wins; otherwise try a member of the enclosing class.
    if let Some(decl) = snap.shallow_decl(&word.text) {
        return Some(HoverInfo {
            symbol: word.text.to_string(),
            kind: decl.kind().describe().to_string(),
            signature: decl.signature(),
        });
    }

    let class = ast.def_at(offset)?;
    let folded = snap.folded_class(&class.name)?;
    let member = folded.members.get(&word.text)?;
    let signature = match member.kind {
        MemberKind::Method => format!(
            "method {}({}) (from {})",
            word.text,
            member.params.join(", "),
            member.origin
        ),
        MemberKind::Prop => format!("prop {} (from {})", word.text, member.origin),
    };
    Some(HoverInfo {
        symbol: word.text.to_string(),
        kind: match member.kind {
            MemberKind::Method => "method",
            MemberKind::Prop => "prop",
        }
        .to_string(),
        signature,
    })
}
