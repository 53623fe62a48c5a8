//! Shallow declarations: per-symbol signatures without transitive resolution.

use loam_core::{Span, SymbolName};
use serde::{Deserialize, Serialize};

use crate::ast::{Ast, DefKind, MemberKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowMethod {
    pub name: SymbolName,
    pub params: Vec<String>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowClass {
    pub name: SymbolName,
    pub parent: Option<SymbolName>,
    pub methods: Vec<ShallowMethod>,
    pub props: Vec<SymbolName>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowFun {
    pub name: SymbolName,
    pub params: Vec<String>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowConst {
    pub name: SymbolName,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShallowDecl {
    Class(ShallowClass),
    Fun(ShallowFun),
    Const(ShallowConst),
}

impl ShallowDecl {
    pub fn name(&self) -> &SymbolName {
        match self {
            ShallowDecl::Class(class) => &class.name,
            ShallowDecl::Fun(fun) => &fun.name,
            ShallowDecl::Const(konst) => &konst.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ShallowDecl::Class(class) => class.span,
            ShallowDecl::Fun(fun) => fun.span,
            ShallowDecl::Const(konst) => konst.span,
        }
    }

    pub fn kind(&self) -> DefKind {
        match self {
            ShallowDecl::Class(_) => DefKind::Class,
            ShallowDecl::Fun(_) => DefKind::Fun,
            ShallowDecl::Const(_) => DefKind::Const,
        }
    }

    /// A one-line signature suitable for hover and completion detail.
    pub fn signature(&self) -> String {
        match self {
            ShallowDecl::Class(class) => match &class.parent {
                Some(parent) => format!("class {} extends {parent}", class.name),
                None => format!("class {}", class.name),
            },
            ShallowDecl::Fun(fun) => format!("fun {}({})", fun.name, fun.params.join(", ")),
            ShallowDecl::Const(konst) => format!("const {}", konst.name),
        }
    }
}

/// Extract the shallow declaration of every definition in `ast`.
pub fn shallow_decls(ast: &Ast) -> Vec<(SymbolName, ShallowDecl)> {
    ast.defs
        .iter()
        .map(|def| {
            let decl = match def.kind {
                DefKind::Class => ShallowDecl::Class(ShallowClass {
                    name: def.name.clone(),
                    parent: def.extends.clone(),
                    methods: def
                        .members
                        .iter()
                        .filter(|m| m.kind == MemberKind::Method)
                        .map(|m| ShallowMethod {
                            name: m.name.clone(),
                            params: m.params.clone(),
                            span: m.span,
                        })
                        .collect(),
                    props: def
                        .members
                        .iter()
                        .filter(|m| m.kind == MemberKind::Prop)
                        .map(|m| m.name.clone())
                        .collect(),
                    span: def.span,
                }),
                DefKind::Fun => ShallowDecl::Fun(ShallowFun {
                    name: def.name.clone(),
                    params: def.params.clone(),
                    span: def.span,
                }),
                DefKind::Const => ShallowDecl::Const(ShallowConst {
                    name: def.name.clone(),
                    span: def.span,
                }),
            };
            (def.name.clone(), decl)
        })
        .collect()
}
