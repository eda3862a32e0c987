//! # Deterministic finite automaton
//!
//! A [`Dfa`] is a tuple `(states, initial, finals)`: `states[i]` is a
//! [`Table`](crate::table::Table) mapping symbol classes to a single target state, and a missing
//! entry means "no transition" — an implicit oblivion state shared by the whole machine. This is
//! the workhorse of the crate: product construction gives the full boolean algebra of regular
//! languages, Hopcroft's algorithm minimizes, and [`paths`] enumerates the accepted language.

pub mod eval;
pub mod minimize;
pub mod paths;
pub mod to_regex;

use crate::alphabet::{Alphabet, SymbolClass};
use crate::symbol::Symbol;
use crate::table::Table;
use std::collections::HashMap;

/// One state's outgoing transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaState<S> {
    transitions: Table<S, usize>,
}

impl<S: Symbol> DfaState<S> {
    pub fn transitions(&self) -> &Table<S, usize> {
        &self.transitions
    }
}

/// A deterministic finite automaton over symbols of type `S`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dfa<S> {
    states: Vec<DfaState<S>>,
    initial_state: usize,
    finals: Vec<usize>,
}

impl<S: Symbol> Dfa<S> {
    /// Builds a DFA from raw per-state transition tables. `finals` need not be sorted; it is
    /// sorted and deduplicated here.
    pub fn from_parts(tables: Vec<Table<S, usize>>, initial_state: usize, mut finals: Vec<usize>) -> Self {
        finals.sort_unstable();
        finals.dedup();
        let states = tables.into_iter().map(|transitions| DfaState { transitions }).collect();
        Dfa { states, initial_state, finals }
    }

    pub fn states(&self) -> &[DfaState<S>] {
        &self.states
    }

    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    pub fn finals(&self) -> &[usize] {
        &self.finals
    }

    pub fn is_final(&self, state: usize) -> bool {
        self.finals.binary_search(&state).is_ok()
    }

    /// The alphabet this machine's transitions actually use: the coarsest common refinement of
    /// every state's own class structure.
    pub fn alphabet(&self) -> Alphabet<S> {
        let classes: Vec<SymbolClass<S>> = self.states.iter().flat_map(|s| s.transitions.classes()).collect();
        Alphabet::refine(&classes)
    }

    /// Steps `state` on `symbol`, returning `None` on falling into the implicit oblivion state.
    pub fn step(&self, state: usize, symbol: S) -> Option<usize> {
        self.states[state].transitions.get(symbol).copied()
    }

    /// Whether this machine accepts `input`.
    pub fn accepts(&self, input: &[S]) -> bool {
        let mut state = self.initial_state;
        for &sym in input {
            match self.step(state, sym) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_final(state)
    }

    /// Builds the complement of this machine within its own alphabet: an explicit oblivion state
    /// is added and made final (since every symbol sequence that used to fall off the edge of
    /// the table must now be accepted), and every other state's finality is flipped.
    pub fn invert(&self) -> Self {
        let totaled = self.totalize();
        let finals: Vec<usize> = (0..totaled.states.len()).filter(|s| !totaled.is_final(*s)).collect();
        Dfa { states: totaled.states, initial_state: totaled.initial_state, finals }
    }

    /// Adds an explicit oblivion state and gives every state an entry for every class of this
    /// machine's alphabet, so the transition function becomes total.
    fn totalize(&self) -> Self {
        let labels: Vec<S> = self.alphabet().classes().map(|c| c.label()).collect();
        let oblivion = self.states.len();
        let mut states: Vec<DfaState<S>> = self
            .states
            .iter()
            .map(|st| {
                let mut table = Table::new();
                for &label in &labels {
                    table.insert(label, st.transitions.get(label).copied().unwrap_or(oblivion));
                }
                DfaState { transitions: table }
            })
            .collect();
        let mut oblivion_table = Table::new();
        for &label in &labels {
            oblivion_table.insert(label, oblivion);
        }
        states.push(DfaState { transitions: oblivion_table });
        Dfa { states, initial_state: self.initial_state, finals: self.finals.clone() }
    }

    /// Generalized product construction over `k` machines: the resulting state set is explored
    /// breadth-first from the tuple of initials, where each coordinate is `None` once that
    /// machine has fallen into oblivion. `f` decides finality of a product state from the
    /// per-machine finality of its non-`None` coordinates (`false` for a fallen-off coordinate).
    pub fn product_construction(machines: &[&Dfa<S>], f: impl Fn(&[bool]) -> bool) -> Dfa<S> {
        let initial_tuple: Vec<Option<usize>> = machines.iter().map(|m| Some(m.initial_state)).collect();
        let mut index_of: HashMap<Vec<Option<usize>>, usize> = HashMap::new();
        let mut tuples: Vec<Vec<Option<usize>>> = vec![initial_tuple.clone()];
        index_of.insert(initial_tuple, 0);

        let mut tables: Vec<Table<S, usize>> = Vec::new();
        let mut finals: Vec<usize> = Vec::new();

        let mut frontier = 0;
        while frontier < tuples.len() {
            let tuple = tuples[frontier].clone();
            let finality: Vec<bool> = tuple
                .iter()
                .zip(machines)
                .map(|(src, m)| src.map(|s| m.is_final(s)).unwrap_or(false))
                .collect();
            if f(&finality) {
                finals.push(frontier);
            }

            let classes: Vec<SymbolClass<S>> = tuple
                .iter()
                .zip(machines)
                .filter_map(|(src, m)| src.map(|s| m.states[s].transitions.classes()))
                .flatten()
                .collect();
            let labels: Vec<S> = Alphabet::refine(&classes).classes().map(|c| c.label()).collect();

            let mut table = Table::new();
            for &label in &labels {
                let next_tuple: Vec<Option<usize>> = tuple
                    .iter()
                    .zip(machines)
                    .map(|(src, m)| src.and_then(|s| m.states[s].transitions.get(label).copied()))
                    .collect();
                let idx = match index_of.get(&next_tuple) {
                    Some(&i) => i,
                    None => {
                        let i = tuples.len();
                        index_of.insert(next_tuple.clone(), i);
                        tuples.push(next_tuple);
                        i
                    }
                };
                table.insert(label, idx);
            }
            tables.push(table);
            frontier += 1;
        }

        Dfa::from_parts(tables, 0, finals)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::product_construction(&[self, other], |f| f[0] || f[1])
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self::product_construction(&[self, other], |f| f[0] && f[1])
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self::product_construction(&[self, other], |f| f[0] && !f[1])
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        Self::product_construction(&[self, other], |f| f[0] != f[1])
    }

    /// Two DFAs accept the same language iff their symmetric-difference product (which, by
    /// construction, only ever contains reachable states) has no final state at all.
    pub fn equivalent_to(&self, other: &Self) -> bool {
        self.symmetric_difference(other).finals.is_empty()
    }

    /// `optional(A)`: the identity plus an empty string, by adding the initial state to `finals`.
    pub fn optional(&self) -> Self {
        let mut finals = self.finals.clone();
        finals.push(self.initial_state);
        Dfa::from_parts(self.states.iter().map(|s| s.transitions.clone()).collect(), self.initial_state, finals)
    }

    pub fn minimized(&self) -> Self {
        minimize::minimize(self)
    }

    pub fn normalized(&self) -> Self {
        minimize::normalize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::Nfa;

    fn digit_dfa() -> Dfa<u32> {
        Nfa::from_symbol_class(SymbolClass::range(0x30, 0x39)).to_dfa()
    }

    #[test]
    fn digit_accepts_single_digits_only() {
        let dfa = digit_dfa();
        assert!(dfa.accepts(&[0x30]));
        assert!(dfa.accepts(&[0x39]));
        assert!(!dfa.accepts(&[0x2f]));
        assert!(!dfa.accepts(&[0x30, 0x31]));
    }

    #[test]
    fn invert_complements_within_own_alphabet() {
        let dfa = digit_dfa();
        let inverted = dfa.invert();
        assert!(!inverted.accepts(&[0x30]));
        assert!(inverted.accepts(&[0x2f]));
        assert!(inverted.accepts(&[0x30, 0x31])); // length 2 was never accepted by `dfa`
    }

    #[test]
    fn union_and_intersection_laws() {
        let a = Nfa::from_symbol_class(SymbolClass::range(0x30u32, 0x39)).to_dfa();
        let b = Nfa::from_symbol_class(SymbolClass::range(0x35u32, 0x41)).to_dfa();
        let union = a.union(&b);
        let intersection = a.intersection(&b);
        for sym in 0x30u32..0x42 {
            let expect_union = a.accepts(&[sym]) || b.accepts(&[sym]);
            let expect_inter = a.accepts(&[sym]) && b.accepts(&[sym]);
            assert_eq!(union.accepts(&[sym]), expect_union);
            assert_eq!(intersection.accepts(&[sym]), expect_inter);
        }
    }

    #[test]
    fn product_state_count_is_bounded_by_product_of_sizes() {
        let a = Nfa::from_symbol_class(SymbolClass::range(0x30u32, 0x39)).to_dfa();
        let b = Nfa::from_symbol_class(SymbolClass::range(0x35u32, 0x41)).to_dfa();
        let product = a.union(&b);
        assert!(product.states().len() <= a.states().len() * b.states().len());
    }

    #[test]
    fn equivalent_to_is_reflexive_and_detects_difference() {
        let a = digit_dfa();
        assert!(a.equivalent_to(&a.clone()));
        let b = Nfa::from_symbol_class(SymbolClass::range(0x30u32, 0x38)).to_dfa();
        assert!(!a.equivalent_to(&b));
    }
}
