//! Step-by-step evaluation of an [`Nfa`] against a symbol stream, without building the full
//! subset-construction DFA first.

use crate::nfa::Nfa;
use crate::symbol::Symbol;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub struct NfaEvaluator<'a, S> {
    nfa: &'a Nfa<S>,
    current_states: BTreeSet<usize>,
}

impl<'a, S: Symbol> NfaEvaluator<'a, S> {
    pub fn new(nfa: &'a Nfa<S>) -> Self {
        let mut evaluator = NfaEvaluator { nfa, current_states: nfa.initials().iter().copied().collect() };
        evaluator.include_closure();
        evaluator
    }

    pub fn is_accepting(&self) -> bool {
        self.current_states.iter().any(|s| self.nfa.finals().contains(s))
    }

    pub fn current_states(&self) -> &BTreeSet<usize> {
        &self.current_states
    }

    pub fn step(&mut self, symbol: S) {
        let mut next = BTreeSet::new();
        for &state in &self.current_states {
            if let Some(targets) = self.nfa.states()[state].get(symbol) {
                next.extend(targets.iter().copied());
            }
        }
        self.current_states = next;
        self.include_closure();
    }

    pub fn step_all(&mut self, input: &[S]) {
        for &sym in input {
            self.step(sym);
        }
    }

    fn include_closure(&mut self) {
        let mut stack: Vec<usize> = self.current_states.iter().copied().collect();
        while let Some(state) = stack.pop() {
            for &target in self.nfa.epsilon_transitions(state) {
                if self.current_states.insert(target) {
                    stack.push(target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::SymbolClass;

    #[test]
    fn evaluator_matches_accepts() {
        let nfa = Nfa::from_symbol_class(SymbolClass::range(1u32, 5)).star();
        let mut eval = NfaEvaluator::new(&nfa);
        assert!(eval.is_accepting());
        eval.step_all(&[2, 3, 4]);
        assert!(eval.is_accepting());
        eval.step(10);
        assert!(!eval.is_accepting());
    }
}
