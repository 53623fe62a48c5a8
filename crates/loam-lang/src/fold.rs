//! Folded declarations and class linearization.
//!
//! Folding resolves a class's inherited members through its ancestor chain.
//! The chain is obtained from a [`ShallowProvider`] so the caller decides
//! where shallow declarations come from (shared cache, quarantine side store,
//! disk).

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use loam_core::{Span, SymbolName};
use serde::{Deserialize, Serialize};

use crate::ast::MemberKind;
use crate::shallow::ShallowClass;

/// The method-resolution order of a class: the class itself followed by its
/// ancestors, nearest first.
pub type Linearization = Vec<SymbolName>;

/// Where shallow class declarations come from during folding.
pub trait ShallowProvider {
    fn shallow_class(&self, name: &SymbolName) -> Option<Arc<ShallowClass>>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldedMember {
    /// The class in the linearization that supplied this member.
    pub origin: SymbolName,
    pub kind: MemberKind,
    pub params: Vec<String>,
    pub span: Span,
}

/// A class with all inherited members resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldedClass {
    pub name: SymbolName,
    pub linearization: Linearization,
    pub members: BTreeMap<SymbolName, FoldedMember>,
    pub span: Span,
}

/// Compute the linearization of `name`, or `None` if it is not a known class.
///
/// Unknown ancestors end the chain; a class appearing twice (inheritance
/// cycle) is skipped, so the walk always terminates.
pub fn linearize(name: &SymbolName, provider: &dyn ShallowProvider) -> Option<Linearization> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = provider.shallow_class(name)?;
    loop {
        if !seen.insert(current.name.clone()) {
            break;
        }
        chain.push(current.name.clone());
        let Some(parent) = current.parent.as_ref() else {
            break;
        };
        let Some(next) = provider.shallow_class(parent) else {
            break;
        };
        current = next;
    }
    Some(chain)
}

/// Fold `name` through its ancestor chain. The nearest definition of a member
/// wins.
pub fn fold_class(name: &SymbolName, provider: &dyn ShallowProvider) -> Option<FoldedClass> {
    let linearization = linearize(name, provider)?;
    let span = provider.shallow_class(name)?.span;

    let mut members = BTreeMap::new();
    for ancestor in linearization.iter().rev() {
        let Some(class) = provider.shallow_class(ancestor) else {
            continue;
        };
        for method in &class.methods {
            members.insert(
                method.name.clone(),
                FoldedMember {
                    origin: ancestor.clone(),
                    kind: MemberKind::Method,
                    params: method.params.clone(),
                    span: method.span,
                },
            );
        }
        for prop in &class.props {
            members.insert(
                prop.clone(),
                FoldedMember {
                    origin: ancestor.clone(),
                    kind: MemberKind::Prop,
                    params: Vec::new(),
                    span: class.span,
                },
            );
        }
    }

    Some(FoldedClass {
        name: name.clone(),
        linearization,
        members,
        span,
    })
}
