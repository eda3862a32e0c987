//! # Regular expressions
//!
//! [`RegexTree`] is the algebraic core: an alternation/concatenation/star/range tree over symbol
//! classes, kept normalized by construction (flattened, deduplicated, short-circuited on the
//! empty language) so that structurally equal trees are always `==`. [`Regex`] wraps a tree and
//! prints it in any [`Dialect`](dialect::Dialect).

pub mod dialect;

use crate::alphabet::SymbolClass;
use crate::nfa::Nfa;
use crate::symbol::Symbol;
use std::fmt;

/// The regular-expression algebra: alternation, concatenation, Kleene star, and symbol-class
/// ranges. The empty language is `Alternation(vec![])`; epsilon is `Concatenation(vec![])`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegexTree<S> {
    Alternation(Vec<RegexTree<S>>),
    Concatenation(Vec<RegexTree<S>>),
    Star(Box<RegexTree<S>>),
    Range(SymbolClass<S>),
}

impl<S: Symbol> RegexTree<S> {
    pub fn empty() -> Self {
        RegexTree::Alternation(vec![])
    }

    pub fn epsilon() -> Self {
        RegexTree::Concatenation(vec![])
    }

    pub fn range(class: SymbolClass<S>) -> Self {
        RegexTree::Range(class)
    }

    pub fn is_empty_language(&self) -> bool {
        matches!(self, RegexTree::Alternation(v) if v.is_empty())
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, RegexTree::Concatenation(v) if v.is_empty())
    }

    /// Builds a normalized alternation: nested alternations flatten, the empty language vanishes
    /// (it is the identity), and duplicate children are dropped.
    pub fn alternation(parts: Vec<Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for part in parts {
            match part {
                RegexTree::Alternation(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.retain(|t| !t.is_empty_language());
        let mut deduped: Vec<Self> = Vec::new();
        for t in flat {
            if !deduped.contains(&t) {
                deduped.push(t);
            }
        }
        match deduped.len() {
            0 => RegexTree::empty(),
            1 => deduped.into_iter().next().unwrap(),
            _ => RegexTree::Alternation(deduped),
        }
    }

    /// Builds a normalized concatenation: nested concatenations flatten, epsilon children vanish
    /// (it is the identity), and the whole thing short-circuits to the empty language if any
    /// child is the empty language (a zero for concatenation).
    pub fn concatenation(parts: Vec<Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for part in parts {
            if part.is_empty_language() {
                return RegexTree::empty();
            }
            match part {
                RegexTree::Concatenation(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.retain(|t| !t.is_epsilon());
        match flat.len() {
            0 => RegexTree::epsilon(),
            1 => flat.into_iter().next().unwrap(),
            _ => RegexTree::Concatenation(flat),
        }
    }

    /// Builds a normalized star: `star(empty) == epsilon`, `star(epsilon) == epsilon`,
    /// `star(star(x)) == star(x)`.
    pub fn star(inner: Self) -> Self {
        if inner.is_empty_language() || inner.is_epsilon() {
            return RegexTree::epsilon();
        }
        match inner {
            RegexTree::Star(_) => inner,
            other => RegexTree::Star(Box::new(other)),
        }
    }

    /// Precedence rank used by the dialect printer: lower binds tighter. A child is wrapped in
    /// grouping delimiters iff its rank is `>=` its parent's.
    fn precedence(&self) -> u8 {
        match self {
            RegexTree::Range(_) => 0,
            RegexTree::Star(_) => 1,
            RegexTree::Concatenation(_) => 2,
            RegexTree::Alternation(_) => 3,
        }
    }
}

/// A regular expression: a normalized [`RegexTree`] plus printing/matching behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regex<S> {
    tree: RegexTree<S>,
}

impl<S: Symbol> Regex<S> {
    pub fn new(tree: RegexTree<S>) -> Self {
        Regex { tree }
    }

    pub fn tree(&self) -> &RegexTree<S> {
        &self.tree
    }

    /// Builds the equivalent NFA via Thompson-style recursive construction.
    pub fn to_nfa(&self) -> Nfa<S> {
        Self::tree_to_nfa(&self.tree)
    }

    fn tree_to_nfa(tree: &RegexTree<S>) -> Nfa<S> {
        match tree {
            RegexTree::Range(class) => Nfa::from_symbol_class(class.clone()),
            RegexTree::Alternation(parts) => {
                if parts.is_empty() {
                    return Nfa::empty_language();
                }
                parts.iter().map(Self::tree_to_nfa).reduce(|a, b| a.union(b)).unwrap()
            }
            RegexTree::Concatenation(parts) => {
                if parts.is_empty() {
                    return Nfa::epsilon();
                }
                Nfa::concatenate(parts.iter().map(Self::tree_to_nfa).collect())
            }
            RegexTree::Star(inner) => Self::tree_to_nfa(inner).star(),
        }
    }

    pub fn accepts(&self, input: &[S]) -> bool {
        self.to_nfa().accepts(input)
    }

    pub fn to_string_in(&self, dialect: &dialect::Dialect) -> String {
        dialect::print(&self.tree, dialect)
    }
}

impl<S: Symbol> fmt::Display for Regex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_in(&dialect::Dialect::perl()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternation_flattens_and_dedups() {
        let a = RegexTree::range(SymbolClass::single(1u32));
        let tree = RegexTree::alternation(vec![
            RegexTree::alternation(vec![a.clone(), a.clone()]),
            a.clone(),
        ]);
        assert_eq!(tree, a);
    }

    #[test]
    fn concatenation_short_circuits_on_empty() {
        let a = RegexTree::range(SymbolClass::single(1u32));
        let tree = RegexTree::concatenation(vec![a, RegexTree::empty()]);
        assert!(tree.is_empty_language());
    }

    #[test]
    fn star_of_empty_is_epsilon() {
        assert!(RegexTree::<u32>::star(RegexTree::empty()).is_epsilon());
    }

    #[test]
    fn star_is_idempotent() {
        let a = RegexTree::range(SymbolClass::single(1u32));
        let once = RegexTree::star(a);
        let twice = RegexTree::star(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn regex_to_nfa_matches_tree_language() {
        let digit = RegexTree::range(SymbolClass::range(0x30u32, 0x39));
        let regex = Regex::new(RegexTree::star(digit));
        assert!(regex.accepts(&[]));
        assert!(regex.accepts(&[0x33, 0x37]));
        assert!(!regex.accepts(&[0x41]));
    }
}
