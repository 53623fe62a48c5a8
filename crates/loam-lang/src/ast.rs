//! Line-oriented parser for Loam source files.
//!
//! The surface is small: `class Name [extends Parent] { ... }` with `method`
//! and `prop` members, top-level `fun name(params)` and `const NAME`, plus
//! `//` line comments. The parser is total: malformed lines are skipped, an
//! unclosed class body ends at the next top-level definition.

use loam_core::{Span, SymbolName};
use serde::{Deserialize, Serialize};

const KEYWORDS: &[&str] = &["class", "extends", "method", "prop", "fun", "const"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefKind {
    Class,
    Fun,
    Const,
}

impl DefKind {
    pub fn describe(self) -> &'static str {
        match self {
            DefKind::Class => "class",
            DefKind::Fun => "fun",
            DefKind::Const => "const",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Method,
    Prop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub name: SymbolName,
    pub kind: MemberKind,
    pub params: Vec<String>,
    /// Span of the member name.
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Def {
    pub name: SymbolName,
    pub kind: DefKind,
    pub extends: Option<SymbolName>,
    pub members: Vec<Member>,
    pub params: Vec<String>,
    /// Span of the definition name.
    pub span: Span,
    /// Span of the whole definition, body included.
    pub extent: Span,
}

/// An identifier occurrence (keywords excluded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    pub text: SymbolName,
    pub span: Span,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ast {
    pub defs: Vec<Def>,
    pub words: Vec<Word>,
}

impl Ast {
    pub fn def(&self, name: &str) -> Option<&Def> {
        self.defs.iter().find(|def| def.name.as_str() == name)
    }

    /// The definition whose extent contains `offset`, if any.
    pub fn def_at(&self, offset: u32) -> Option<&Def> {
        self.defs.iter().find(|def| def.extent.contains(offset))
    }

    /// The identifier at `offset`. A cursor sitting immediately after the
    /// last character of a word still counts as being on that word.
    pub fn word_at(&self, offset: u32) -> Option<&Word> {
        self.words
            .iter()
            .find(|word| word.span.contains(offset) || word.span.end == offset)
    }
}

struct Token<'a> {
    text: &'a str,
    span: Span,
}

fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_word_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn tokenize(text: &str, base: u32) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'/') {
            break;
        }
        if is_word_start(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_word_continue(bytes[i]) {
                i += 1;
            }
            tokens.push(Token {
                text: &text[start..i],
                span: Span::new(base + start as u32, base + i as u32),
            });
        } else {
            i += 1;
        }
    }
    tokens
}

fn parse_params(line: &str) -> Vec<String> {
    let Some(open) = line.find('(') else {
        return Vec::new();
    };
    let close = line[open..].find(')').map(|i| open + i).unwrap_or(line.len());
    line[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn parse(text: &str) -> Ast {
    let mut defs: Vec<Def> = Vec::new();
    let mut words: Vec<Word> = Vec::new();
    let mut open_class: Option<Def> = None;

    let mut close_class = |class: &mut Option<Def>, defs: &mut Vec<Def>, end: u32| {
        if let Some(mut def) = class.take() {
            def.extent.end = end.max(def.extent.start);
            defs.push(def);
        }
    };

    let mut line_start = 0u32;
    for line in text.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len() as u32;
        let line = line.trim_end_matches('\n');
        let line_end = start + line.len() as u32;

        let tokens = tokenize(line, start);
        for token in &tokens {
            if !KEYWORDS.contains(&token.text) {
                words.push(Word {
                    text: SymbolName::from(token.text),
                    span: token.span,
                });
            }
        }

        let Some(first) = tokens.first() else {
            if line.trim_start().starts_with('}') {
                close_class(&mut open_class, &mut defs, line_end);
            }
            continue;
        };

        match first.text {
            "class" => {
                close_class(&mut open_class, &mut defs, start.saturating_sub(1));
                let Some(name) = tokens.get(1) else {
                    continue;
                };
                let extends = match tokens.get(2) {
                    Some(tok) if tok.text == "extends" => tokens
                        .get(3)
                        .map(|parent| SymbolName::from(parent.text)),
                    _ => None,
                };
                open_class = Some(Def {
                    name: SymbolName::from(name.text),
                    kind: DefKind::Class,
                    extends,
                    members: Vec::new(),
                    params: Vec::new(),
                    span: name.span,
                    extent: Span::new(start, line_end),
                });
            }
            "method" | "prop" => {
                let Some(class) = open_class.as_mut() else {
                    continue;
                };
                let Some(name) = tokens.get(1) else {
                    continue;
                };
                let kind = if first.text == "method" {
                    MemberKind::Method
                } else {
                    MemberKind::Prop
                };
                class.members.push(Member {
                    name: SymbolName::from(name.text),
                    kind,
                    params: if kind == MemberKind::Method {
                        parse_params(line)
                    } else {
                        Vec::new()
                    },
                    span: name.span,
                });
                class.extent.end = line_end;
            }
            "fun" => {
                close_class(&mut open_class, &mut defs, start.saturating_sub(1));
                let Some(name) = tokens.get(1) else {
                    continue;
                };
                defs.push(Def {
                    name: SymbolName::from(name.text),
                    kind: DefKind::Fun,
                    extends: None,
                    members: Vec::new(),
                    params: parse_params(line),
                    span: name.span,
                    extent: Span::new(start, line_end),
                });
            }
            "const" => {
                close_class(&mut open_class, &mut defs, start.saturating_sub(1));
                let Some(name) = tokens.get(1) else {
                    continue;
                };
                defs.push(Def {
                    name: SymbolName::from(name.text),
                    kind: DefKind::Const,
                    extends: None,
                    members: Vec::new(),
                    params: Vec::new(),
                    span: name.span,
                    extent: Span::new(start, line_end),
                });
            }
            _ => {
                if line.trim_start().starts_with('}') {
                    close_class(&mut open_class, &mut defs, line_end);
                }
            }
        }
    }
    close_class(&mut open_class, &mut defs, text.len() as u32);

    Ast { defs, words }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\
class Greeter extends Base {
    method greet(name, punctuation)
    prop volume
}

fun main(args) // entry point
const MAX_DEPTH
";

    #[test]
    fn parses_defs_and_members() {
        let ast = parse(SOURCE);
        let names: Vec<_> = ast.defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Greeter", "main", "MAX_DEPTH"]);

        let greeter = ast.def("Greeter").unwrap();
        assert_eq!(greeter.kind, DefKind::Class);
        assert_eq!(greeter.extends.as_ref().unwrap().as_str(), "Base");
        assert_eq!(greeter.members.len(), 2);
        assert_eq!(greeter.members[0].params, vec!["name", "punctuation"]);
        assert_eq!(greeter.members[1].kind, MemberKind::Prop);

        let main = ast.def("main").unwrap();
        assert_eq!(main.kind, DefKind::Fun);
        assert_eq!(main.params, vec!["args"]);
    }

    #[test]
    fn words_exclude_keywords_and_comments() {
        let ast = parse(SOURCE);
        assert!(ast.words.iter().all(|w| w.text.as_str() != "class"));
        assert!(ast.words.iter().all(|w| w.text.as_str() != "entry"));
        assert!(ast.words.iter().any(|w| w.text.as_str() == "Base"));
    }

    #[test]
    fn word_at_matches_cursor_at_word_end() {
        let ast = parse("fun main(args)\n");
        let word = ast.word_at(8).unwrap();
        assert_eq!(word.text.as_str(), "main");
    }

    #[test]
    fn def_at_covers_class_body() {
        let ast = parse(SOURCE);
        let greeter = ast.def("Greeter").unwrap();
        let inside = greeter.members[0].span.start;
        assert_eq!(ast.def_at(inside).unwrap().name.as_str(), "Greeter");
    }

    #[test]
    fn unclosed_class_ends_at_next_definition() {
        let ast = parse("class A {\n    method m()\nfun f()\n");
        assert_eq!(ast.defs.len(), 2);
        assert_eq!(ast.def("A").unwrap().members.len(), 1);
        assert!(ast.def("f").is_some());
    }
}
