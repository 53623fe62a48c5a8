//! Signature help for the innermost call at the cursor.

use loam_core::LineCol;
use loam_decl::Snapshot;
use loam_lang::{MemberKind, ShallowDecl};
use loam_vfs::Entry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHelp {
    pub label: String,
    pub params: Vec<String>,
    pub active_param: u32,
}

/// Find the innermost unclosed `(` before `offset` and the comma count since
/// it. Returns the callee-name end offset and the active parameter index.
fn enclosing_call(text: &str, offset: u32) -> Option<(u32, u32)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut commas = 0u32;
    let mut i = (offset as usize).min(bytes.len());
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b')' => depth += 1,
            b',' if depth == 0 => commas += 1,
            b'(' => {
                if depth == 0 {
                    return Some((i as u32, commas));
                }
                depth -= 1;
            }
            b'\n' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

pub fn signature_help(snap: &Snapshot<'_>, entry: &Entry, pos: LineCol) -> Option<SignatureHelp> {
    let offset = entry.offset(pos);
    let (open_paren, active_param) = enclosing_call(entry.text(), offset)?;
    let ast = entry.ast();
    let callee = ast.word_at(open_paren)?;

    if let Some(decl) = snap.shallow_decl(&callee.text) {
        if let ShallowDecl::Fun(fun) = &*decl {
            return Some(SignatureHelp {
                label: decl.signature(),
                params: fun.params.clone(),
                active_param,
            });
        }
    }

    // A method call inside a class body.
    let class = ast.def_at(open_paren)?;
    let folded = snap.folded_class(&class.name)?;
    let member = folded.members.get(&callee.text)?;
    if member.kind != MemberKind::Method {
        return None;
    }
    Some(SignatureHelp {
        label: format!("method {}({})", callee.text, member.params.join(", ")),
        params: member.params.clone(),
        active_param,
    })
}
