//! # Nondeterministic finite automaton, with or without epsilon moves
//!
//! An [`Nfa`] is a tuple `(states, epsilon, initials, finals)`: `states[i]` is a
//! [`Table`](crate::table::Table) mapping symbol classes to *sets* of successor states,
//! `epsilon[i]` is the set of states reachable from `i` by one epsilon move, and `initials`/
//! `finals` are state-index sets. The initial set is kept epsilon-closed at all times.
//!
//! ## Example
//! ```
//! use abnf_lang::alphabet::SymbolClass;
//! use abnf_lang::nfa::Nfa;
//!
//! // One machine per digit, unioned together, then starred: (0|1)*
//! let zero = Nfa::from_symbol_class(SymbolClass::single(b'0' as u32));
//! let one = Nfa::from_symbol_class(SymbolClass::single(b'1' as u32));
//! let binary_digits = zero.union(one).star();
//! assert!(binary_digits.accepts(&[]));
//! assert!(binary_digits.accepts(&[b'0' as u32, b'1' as u32, b'1' as u32]));
//! assert!(!binary_digits.accepts(&[b'2' as u32]));
//! ```

use crate::alphabet::{Alphabet, SymbolClass};
use crate::dfa::Dfa;
use crate::symbol::Symbol;
use crate::table::Table;
use std::collections::{BTreeSet, HashMap};

pub mod eval;

/// Inserts `target` at every range's lower bound in `class`, plus an empty-target sentinel
/// just past each range's upper bound, so [`Table::get`](crate::table::Table::get) stops
/// returning `target` once the queried symbol runs past where `class` actually ends.
fn insert_bounded<S: Symbol>(table: &mut Table<S, Vec<usize>>, class: &SymbolClass<S>, target: Vec<usize>) {
    for &(lo, hi) in class.ranges() {
        table.insert(lo, target.clone());
        if let Some(next) = hi.succ() {
            table.insert(next, vec![]);
        }
    }
}

/// A nondeterministic finite automaton over symbols of type `S`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nfa<S> {
    states: Vec<Table<S, Vec<usize>>>,
    epsilon: Vec<Vec<usize>>,
    initials: Vec<usize>,
    finals: Vec<usize>,
}

impl<S: Symbol> Nfa<S> {
    pub fn states(&self) -> &[Table<S, Vec<usize>>] {
        &self.states
    }

    pub fn initials(&self) -> &[usize] {
        &self.initials
    }

    pub fn finals(&self) -> &[usize] {
        &self.finals
    }

    pub fn epsilon_transitions(&self, state: usize) -> &[usize] {
        &self.epsilon[state]
    }

    /// A machine accepting no strings at all.
    pub fn empty_language() -> Self {
        Nfa { states: vec![Table::new()], epsilon: vec![vec![]], initials: vec![0], finals: vec![] }
    }

    /// A machine accepting only the empty string.
    pub fn epsilon() -> Self {
        Nfa { states: vec![Table::new()], epsilon: vec![vec![]], initials: vec![0], finals: vec![0] }
    }

    /// A machine accepting exactly the one-symbol strings whose symbol is in `class`.
    pub fn from_symbol_class(class: SymbolClass<S>) -> Self {
        let mut start = Table::new();
        insert_bounded(&mut start, &class, vec![1]);
        Nfa {
            states: vec![start, Table::new()],
            epsilon: vec![vec![], vec![]],
            initials: vec![0],
            finals: vec![1],
        }
    }

    /// A machine accepting exactly the literal sequence `seq`, as a linear chain of states.
    pub fn from_sequence(seq: &[S]) -> Self {
        if seq.is_empty() {
            return Nfa {
                states: vec![Table::new()],
                epsilon: vec![vec![]],
                initials: vec![0],
                finals: vec![0],
            };
        }
        let mut states = Vec::with_capacity(seq.len() + 1);
        let mut epsilon = Vec::with_capacity(seq.len() + 1);
        for (i, &sym) in seq.iter().enumerate() {
            let mut table = Table::new();
            insert_bounded(&mut table, &SymbolClass::single(sym), vec![i + 1]);
            states.push(table);
            epsilon.push(vec![]);
        }
        states.push(Table::new());
        epsilon.push(vec![]);
        Nfa { states, epsilon, initials: vec![0], finals: vec![seq.len()] }
    }

    /// Trivial widening of a DFA: every transition becomes a singleton-target edge, the DFA's
    /// implicit oblivion state is simply not represented (missing entries mean "no move").
    pub fn from_dfa(dfa: &Dfa<S>) -> Self {
        let states = dfa
            .states()
            .iter()
            .map(|st| st.transitions().iter().map(|(label, &target)| (label, vec![target])).collect())
            .collect();
        Nfa {
            states,
            epsilon: vec![vec![]; dfa.states().len()],
            initials: vec![dfa.initial_state()],
            finals: dfa.finals().to_vec(),
        }
    }

    fn offset(&self, delta: usize) -> Self {
        let states = self
            .states
            .iter()
            .map(|table| table.iter().map(|(label, targets)| (label, targets.iter().map(|t| t + delta).collect())).collect())
            .collect();
        let epsilon = self.epsilon.iter().map(|ts| ts.iter().map(|t| t + delta).collect()).collect();
        Nfa {
            states,
            epsilon,
            initials: self.initials.iter().map(|i| i + delta).collect(),
            finals: self.finals.iter().map(|i| i + delta).collect(),
        }
    }

    /// Disjoint union: the resulting machine's initial set is the union of both machines'
    /// (already epsilon-closed) initial sets, so it accepts `w` iff either machine does.
    pub fn union(self, other: Self) -> Self {
        let delta = self.states.len();
        let shifted = other.offset(delta);
        let mut states = self.states;
        states.extend(shifted.states);
        let mut epsilon = self.epsilon;
        epsilon.extend(shifted.epsilon);
        let mut initials = self.initials;
        initials.extend(shifted.initials);
        initials.sort_unstable();
        initials.dedup();
        let mut finals = self.finals;
        finals.extend(shifted.finals);
        finals.sort_unstable();
        finals.dedup();
        Nfa { states, epsilon, initials, finals }
    }

    /// Chains the machines in order: an epsilon edge runs from every final of machine `k` to
    /// every initial of machine `k+1`. The result's initials are the first machine's, its finals
    /// the last machine's. Panics if `machines` is empty.
    pub fn concatenate(machines: Vec<Self>) -> Self {
        assert!(!machines.is_empty(), "concatenate requires at least one machine");
        let mut iter = machines.into_iter();
        let mut acc = iter.next().unwrap();
        for next in iter {
            let delta = acc.states.len();
            let shifted = next.offset(delta);
            let prior_finals = acc.finals.clone();
            acc.states.extend(shifted.states);
            acc.epsilon.extend(shifted.epsilon);
            for &f in &prior_finals {
                acc.epsilon[f].extend(shifted.initials.iter().copied());
                acc.epsilon[f].sort_unstable();
                acc.epsilon[f].dedup();
            }
            acc.finals = shifted.finals;
        }
        acc
    }

    /// Adds an epsilon edge from every final state back to every initial state, so one-or-more
    /// repetitions of the original language are accepted.
    pub fn plus(mut self) -> Self {
        for &f in &self.finals.clone() {
            self.epsilon[f].extend(self.initials.iter().copied());
            self.epsilon[f].sort_unstable();
            self.epsilon[f].dedup();
        }
        self
    }

    /// `plus`, then marks the initial states as final, so zero-or-more repetitions are accepted.
    pub fn star(self) -> Self {
        let mut nfa = self.plus();
        nfa.finals.extend(nfa.initials.iter().copied());
        nfa.finals.sort_unstable();
        nfa.finals.dedup();
        nfa
    }

    /// Replaces every transition's symbol class with the (possibly empty, possibly
    /// multi-symbol) chain `map` returns for it: an empty chain becomes an epsilon edge, a chain
    /// of `n` symbols becomes `n` transitions through `n - 1` fresh intermediate states. The
    /// whole class is assumed to map uniformly — `map` is applied once per transition, not once
    /// per symbol, so it is meant for letter-to-word homomorphisms over a symbol-level NFA (one
    /// class per transition, as produced by [`from_sequence`](Nfa::from_sequence) or
    /// [`from_symbol_class`](Nfa::from_symbol_class)), not over an already-coarsened alphabet.
    pub fn homomorphism(&self, map: impl Fn(&SymbolClass<S>) -> Vec<S>) -> Self {
        let mut states: Vec<Table<S, Vec<usize>>> = vec![Table::new(); self.states.len()];
        let mut epsilon = self.epsilon.clone();

        for (i, table) in self.states.iter().enumerate() {
            for class in table.classes() {
                let targets = table.get(class.label()).cloned().unwrap_or_default();
                if targets.is_empty() {
                    continue;
                }
                let chain = map(&class);
                if chain.is_empty() {
                    epsilon[i].extend(targets.iter().copied());
                    epsilon[i].sort_unstable();
                    epsilon[i].dedup();
                    continue;
                }
                let mut prev = i;
                for (k, &sym) in chain.iter().enumerate() {
                    if k + 1 == chain.len() {
                        states[prev].insert(sym, targets.clone());
                    } else {
                        let fresh = states.len();
                        states.push(Table::new());
                        epsilon.push(vec![]);
                        states[prev].insert(sym, vec![fresh]);
                        prev = fresh;
                    }
                }
            }
        }

        Nfa { states, epsilon, initials: self.initials.clone(), finals: self.finals.clone() }
    }

    fn closure(&self, from: &[usize]) -> Vec<usize> {
        let mut seen: BTreeSet<usize> = from.iter().copied().collect();
        let mut stack: Vec<usize> = from.to_vec();
        while let Some(s) = stack.pop() {
            for &t in &self.epsilon[s] {
                if seen.insert(t) {
                    stack.push(t);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// The alphabet of this machine: the coarsest common refinement of every state's own
    /// transition-class structure.
    pub fn alphabet(&self) -> Alphabet<S> {
        let classes: Vec<SymbolClass<S>> = self.states.iter().flat_map(Table::classes).collect();
        Alphabet::refine(&classes)
    }

    fn alphabet_of(&self, states: &[usize]) -> Alphabet<S> {
        let classes: Vec<SymbolClass<S>> = states.iter().flat_map(|&s| self.states[s].classes()).collect();
        Alphabet::refine(&classes)
    }

    /// Subset construction: builds the equivalent [`Dfa`]. Each DFA state corresponds to one
    /// epsilon-closed set of NFA states, discovered breadth-first starting from the
    /// epsilon-closure of `initials`. A DFA state is final iff its set intersects `finals`.
    pub fn to_dfa(&self) -> Dfa<S> {
        let start = self.closure(&self.initials);
        let mut index_of: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut sets: Vec<Vec<usize>> = Vec::new();
        index_of.insert(start.clone(), 0);
        sets.push(start);

        let mut dfa_tables: Vec<Table<S, usize>> = Vec::new();
        let mut dfa_finals: Vec<usize> = Vec::new();

        let mut frontier = 0;
        while frontier < sets.len() {
            let current = sets[frontier].clone();
            if current.iter().any(|s| self.finals.contains(s)) {
                dfa_finals.push(frontier);
            }
            let alphabet = self.alphabet_of(&current);
            let labels: Vec<S> = alphabet.classes().map(|c| c.label()).collect();
            let mut table = Table::new();
            for &label in &labels {
                let mut targets: BTreeSet<usize> = BTreeSet::new();
                for &state in &current {
                    if let Some(ts) = self.states[state].get(label) {
                        targets.extend(ts.iter().copied());
                    }
                }
                let closed = self.closure(&targets.into_iter().collect::<Vec<_>>());
                let target_idx = match index_of.get(&closed) {
                    Some(&idx) => idx,
                    None => {
                        let idx = sets.len();
                        index_of.insert(closed.clone(), idx);
                        sets.push(closed);
                        idx
                    }
                };
                table.insert(label, target_idx);
            }
            dfa_tables.push(table);
            frontier += 1;
        }

        Dfa::from_parts(dfa_tables, 0, dfa_finals)
    }

    /// Whether this machine accepts `input`, by repeatedly stepping an [`eval::NfaEvaluator`].
    pub fn accepts(&self, input: &[S]) -> bool {
        let mut evaluator = eval::NfaEvaluator::new(self);
        for &sym in input {
            evaluator.step(sym);
        }
        evaluator.is_accepting()
    }

    /// Whether this machine has any epsilon transition at all.
    pub fn has_epsilon_moves(&self) -> bool {
        self.epsilon.iter().any(|e| !e.is_empty())
    }

    /// Two machines accept the same language iff their subset-constructed DFAs, minimized, are
    /// equivalent.
    pub fn equivalent_to(&self, other: &Self) -> bool {
        self.to_dfa().minimized().equivalent_to(&other.to_dfa().minimized())
    }
}
