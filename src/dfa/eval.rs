//! Step-by-step evaluation of a [`Dfa`] against a symbol stream.

use crate::dfa::Dfa;
use crate::symbol::Symbol;

#[derive(Clone, Debug)]
pub struct DfaEvaluator<'a, S> {
    dfa: &'a Dfa<S>,
    current_state: Option<usize>,
}

impl<'a, S: Symbol> DfaEvaluator<'a, S> {
    pub fn new(dfa: &'a Dfa<S>) -> Self {
        DfaEvaluator { dfa, current_state: Some(dfa.initial_state()) }
    }

    pub fn is_accepting(&self) -> bool {
        self.current_state.map_or(false, |s| self.dfa.is_final(s))
    }

    /// The current state index, or `None` if the machine has fallen into oblivion.
    pub fn current_state(&self) -> Option<usize> {
        self.current_state
    }

    pub fn step(&mut self, symbol: S) -> Option<usize> {
        self.current_state = self.current_state.and_then(|s| self.dfa.step(s, symbol));
        self.current_state
    }

    pub fn step_all(&mut self, input: &[S]) -> Option<usize> {
        for &sym in input {
            self.step(sym);
        }
        self.current_state
    }
}

impl<'a, S: Symbol> From<&'a Dfa<S>> for DfaEvaluator<'a, S> {
    fn from(dfa: &'a Dfa<S>) -> Self {
        DfaEvaluator::new(dfa)
    }
}
