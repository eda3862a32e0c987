//! The capability set every target algebra (DFA, NFA, regex IR) exposes to the ABNF compiler.
//!
//! The source AST is translated into whichever concrete machine a caller asks for through a
//! single trait carrying the handful of constructors the algebra of regular languages actually
//! needs: `empty`/`epsilon`/`symbol_class`, plus `union`/`concatenate`/`star`. [`crate::dfa::Dfa`],
//! [`crate::nfa::Nfa`] and [`crate::regex::Regex`] each implement it.

use crate::alphabet::SymbolClass;
use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::regex::{Regex, RegexTree};

/// A target algebra `to_pattern` can compile an ABNF expression tree into.
pub trait Pattern: Sized + Clone {
    fn empty() -> Self;
    fn epsilon() -> Self;
    fn symbol_class(class: SymbolClass<u32>) -> Self;
    fn union(self, other: Self) -> Self;
    fn concatenate(self, other: Self) -> Self;
    fn star(self) -> Self;

    /// A single closed range `[lo, hi]`.
    fn range(lo: u32, hi: u32) -> Self {
        Self::symbol_class(SymbolClass::range(lo, hi))
    }

    /// A single symbol.
    fn symbol(sym: u32) -> Self {
        Self::symbol_class(SymbolClass::single(sym))
    }

    fn plus(self) -> Self {
        let star = self.clone().star();
        self.concatenate(star)
    }

    fn optional(self) -> Self {
        Self::epsilon().union(self)
    }
}

impl Pattern for Nfa<u32> {
    fn empty() -> Self {
        Nfa::empty_language()
    }

    fn epsilon() -> Self {
        Nfa::epsilon()
    }

    fn symbol_class(class: SymbolClass<u32>) -> Self {
        Nfa::from_symbol_class(class)
    }

    fn union(self, other: Self) -> Self {
        Nfa::union(self, other)
    }

    fn concatenate(self, other: Self) -> Self {
        Nfa::concatenate(vec![self, other])
    }

    fn star(self) -> Self {
        Nfa::star(self)
    }
}

impl Pattern for Dfa<u32> {
    fn empty() -> Self {
        Nfa::<u32>::empty_language().to_dfa()
    }

    fn epsilon() -> Self {
        Nfa::<u32>::epsilon().to_dfa()
    }

    fn symbol_class(class: SymbolClass<u32>) -> Self {
        Nfa::from_symbol_class(class).to_dfa()
    }

    fn union(self, other: Self) -> Self {
        Dfa::union(&self, &other)
    }

    fn concatenate(self, other: Self) -> Self {
        Nfa::concatenate(vec![Nfa::from_dfa(&self), Nfa::from_dfa(&other)]).to_dfa()
    }

    fn star(self) -> Self {
        Nfa::from_dfa(&self).star().to_dfa()
    }
}

impl Pattern for Regex<u32> {
    fn empty() -> Self {
        Regex::new(RegexTree::empty())
    }

    fn epsilon() -> Self {
        Regex::new(RegexTree::epsilon())
    }

    fn symbol_class(class: SymbolClass<u32>) -> Self {
        Regex::new(RegexTree::range(class))
    }

    fn union(self, other: Self) -> Self {
        Regex::new(RegexTree::alternation(vec![self.tree().clone(), other.tree().clone()]))
    }

    fn concatenate(self, other: Self) -> Self {
        Regex::new(RegexTree::concatenation(vec![self.tree().clone(), other.tree().clone()]))
    }

    fn star(self) -> Self {
        Regex::new(RegexTree::star(self.tree().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dfa_and_nfa_and_regex_agree_on_a_simple_union() {
        let a = <Dfa<u32> as Pattern>::range(0x30, 0x39);
        let b = <Dfa<u32> as Pattern>::range(0x41, 0x46);
        let dfa = a.union(b);
        assert!(dfa.accepts(&[0x35]));
        assert!(dfa.accepts(&[0x41]));
        assert!(!dfa.accepts(&[0x61]));
    }

    #[test]
    fn plus_requires_at_least_one_occurrence() {
        let digit = <Nfa<u32> as Pattern>::range(0x30, 0x39);
        let one_or_more = digit.plus();
        assert!(!one_or_more.accepts(&[]));
        assert!(one_or_more.accepts(&[0x31, 0x32]));
    }
}
