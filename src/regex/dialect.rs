//! Dialect-parameterized regex printing.
//!
//! A [`Dialect`] names the surface syntax a [`RegexTree`](super::RegexTree) is rendered into: the
//! delimiters, escape conventions, and meta-characters differ across POSIX extended regular
//! expressions, Perl, ECMAScript, and Swift's `Regex` literal syntax, even though the underlying
//! algebra (alternation/concatenation/star/range) is identical.

use crate::alphabet::SymbolClass;
use crate::symbol::Symbol;
use num_traits::ToPrimitive;

/// The surface syntax a regex tree prints into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialect {
    pub name: &'static str,
    pub group_open: &'static str,
    pub group_close: &'static str,
    pub class_open: &'static str,
    pub class_close: &'static str,
    pub star: &'static str,
    pub alternation: &'static str,
    pub escape: char,
    /// Characters that must be escaped when they appear literally outside a character class.
    pub pattern_meta: &'static [char],
    /// Characters that must be escaped when they appear literally inside a character class.
    pub class_meta: &'static [char],
}

impl Dialect {
    pub fn posix_extended() -> Self {
        Dialect {
            name: "posix-extended",
            group_open: "(",
            group_close: ")",
            class_open: "[",
            class_close: "]",
            star: "*",
            alternation: "|",
            escape: '\\',
            pattern_meta: &['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\'],
            class_meta: &[']', '^', '-', '\\'],
        }
    }

    pub fn perl() -> Self {
        Dialect {
            name: "perl",
            group_open: "(?:",
            group_close: ")",
            class_open: "[",
            class_close: "]",
            star: "*",
            alternation: "|",
            escape: '\\',
            pattern_meta: &['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\'],
            class_meta: &[']', '^', '-', '\\'],
        }
    }

    pub fn ecma_script() -> Self {
        Dialect {
            name: "ecmascript",
            group_open: "(?:",
            group_close: ")",
            class_open: "[",
            class_close: "]",
            star: "*",
            alternation: "|",
            escape: '\\',
            pattern_meta: &['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\', '/'],
            class_meta: &[']', '^', '-', '\\'],
        }
    }

    pub fn swift() -> Self {
        Dialect {
            name: "swift",
            group_open: "(?:",
            group_close: ")",
            class_open: "[",
            class_close: "]",
            star: "*",
            alternation: "|",
            escape: '\\',
            pattern_meta: &['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^', '$', '\\'],
            class_meta: &[']', '^', '-', '\\'],
        }
    }
}

fn render_symbol<S: Symbol>(sym: S) -> String {
    match sym.to_u32().and_then(char::from_u32) {
        Some(c) if !c.is_control() => c.to_string(),
        _ => format!("\\x{{{:x}}}", sym.to_u64().unwrap_or(0)),
    }
}

fn escape_for(ch_repr: &str, meta: &[char], escape: char) -> String {
    if ch_repr.chars().count() == 1 && meta.contains(&ch_repr.chars().next().unwrap()) {
        format!("{escape}{ch_repr}")
    } else {
        ch_repr.to_string()
    }
}

fn print_range<S: Symbol>(class: &SymbolClass<S>, dialect: &Dialect) -> String {
    let ranges = class.ranges();
    if ranges.len() == 1 && ranges[0].0 == ranges[0].1 {
        let repr = render_symbol(ranges[0].0);
        return escape_for(&repr, dialect.pattern_meta, dialect.escape);
    }
    let mut body = String::new();
    for &(lo, hi) in ranges {
        let lo_repr = escape_for(&render_symbol(lo), dialect.class_meta, dialect.escape);
        if lo == hi {
            body.push_str(&lo_repr);
        } else {
            let hi_repr = escape_for(&render_symbol(hi), dialect.class_meta, dialect.escape);
            body.push_str(&lo_repr);
            body.push('-');
            body.push_str(&hi_repr);
        }
    }
    format!("{}{}{}", dialect.class_open, body, dialect.class_close)
}

fn wrap(s: String, dialect: &Dialect) -> String {
    format!("{}{}{}", dialect.group_open, s, dialect.group_close)
}

fn print_child<S: Symbol>(child: &super::RegexTree<S>, parent_rank: u8, dialect: &Dialect) -> String {
    let printed = print(child, dialect);
    if child_precedence(child) >= parent_rank {
        wrap(printed, dialect)
    } else {
        printed
    }
}

fn child_precedence<S: Symbol>(tree: &super::RegexTree<S>) -> u8 {
    match tree {
        super::RegexTree::Range(_) => 0,
        super::RegexTree::Star(_) => 1,
        super::RegexTree::Concatenation(_) => 2,
        super::RegexTree::Alternation(_) => 3,
    }
}

/// Renders `tree` in `dialect`'s surface syntax.
pub fn print<S: Symbol>(tree: &super::RegexTree<S>, dialect: &Dialect) -> String {
    match tree {
        super::RegexTree::Range(class) => print_range(class, dialect),
        super::RegexTree::Alternation(parts) => {
            if parts.is_empty() {
                // The empty language has no literal representation in these dialects; a
                // character class matching nothing is the closest equivalent.
                return format!("{}{}", dialect.class_open, dialect.class_close);
            }
            parts.iter().map(|p| print_child(p, 3, dialect)).collect::<Vec<_>>().join(dialect.alternation)
        }
        super::RegexTree::Concatenation(parts) => {
            if parts.is_empty() {
                return String::new();
            }
            parts.iter().map(|p| print_child(p, 2, dialect)).collect::<Vec<_>>().join("")
        }
        super::RegexTree::Star(inner) => format!("{}{}", print_child(inner, 1, dialect), dialect.star),
    }
}
