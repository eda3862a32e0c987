//! # Partitioned transition table
//!
//! A [`Table`] maps a state's outgoing transitions, keyed by [`SymbolClass`](crate::alphabet::SymbolClass)
//! label rather than by individual symbol: every symbol in a class is guaranteed (by construction
//! of the owning automaton's [`Alphabet`](crate::alphabet::Alphabet)) to transition identically, so
//! there is no reason to store one entry per symbol. Lookup by symbol does a binary search over the
//! sorted class labels to find the covering entry, then returns its value.
//!
//! [`Nfa`](crate::nfa::Nfa) uses `Table<S, Vec<usize>>` (a symbol class may lead to several target
//! states); [`Dfa`](crate::dfa::Dfa) uses `Table<S, usize>` with a missing entry meaning "no
//! transition" (the implicit oblivion state).

use crate::alphabet::SymbolClass;
use crate::symbol::Symbol;

/// A transition table for one state, keyed by symbol-class label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table<S, V> {
    // Sorted ascending by `.0` (the class label) to allow binary search.
    entries: Vec<(S, V)>,
}

impl<S: Symbol, V> Table<S, V> {
    /// An empty table (every symbol is unmapped).
    pub fn new() -> Self {
        Table { entries: Vec::new() }
    }

    /// Builds a table from `(class_label, value)` pairs. Panics if two entries share a label.
    pub fn from_entries(mut entries: Vec<(S, V)>) -> Self {
        entries.sort_by_key(|(label, _)| *label);
        for pair in entries.windows(2) {
            assert_ne!(pair[0].0, pair[1].0, "duplicate symbol-class label in transition table");
        }
        Table { entries }
    }

    /// Inserts or replaces the value for the class labeled `label`.
    pub fn insert(&mut self, label: S, value: V) {
        match self.entries.binary_search_by_key(&label, |(l, _)| *l) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (label, value)),
        }
    }

    /// Looks up the value for the class labeled exactly `label`.
    pub fn get_by_label(&self, label: S) -> Option<&V> {
        self.entries
            .binary_search_by_key(&label, |(l, _)| *l)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Looks up the value for the class covering `symbol`, given that this table has exactly one
    /// entry per class of its owning alphabet and every class label is that class's own lower
    /// bound: the greatest label `<= symbol` is the covering entry, so a single binary search
    /// finds it without consulting the alphabet.
    pub fn get(&self, symbol: S) -> Option<&V> {
        match self.entries.binary_search_by_key(&symbol, |(l, _)| *l) {
            Ok(idx) => Some(&self.entries[idx].1),
            Err(0) => None,
            Err(idx) => Some(&self.entries[idx - 1].1),
        }
    }

    /// Iterates `(label, value)` pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (S, &V)> {
        self.entries.iter().map(|(l, v)| (*l, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `self.get(label)` for every label in `labels`, substituting `default` where this
    /// table has no covering entry. Used when redistributing a state's transitions across a
    /// finer joint alphabet discovered during product construction or subset construction.
    pub fn values_at(&self, labels: &[S], default: V) -> Vec<V>
    where
        V: Clone,
    {
        labels
            .iter()
            .map(|&label| self.get(label).cloned().unwrap_or_else(|| default.clone()))
            .collect()
    }

    /// Reconstructs the ranges this table partitions the symbol space into, inferring each
    /// class's upper bound from the next entry's label (or `S::max_value()` for the last entry).
    /// Used to feed this state's own class structure into [`Alphabet::refine`](crate::alphabet::Alphabet::refine)
    /// when computing a joint alphabet across several states.
    pub fn classes(&self) -> Vec<SymbolClass<S>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, &(lo, _))| {
                let hi = match self.entries.get(i + 1) {
                    Some(&(next_lo, _)) => next_lo.pred().expect("adjacent table labels must differ"),
                    None => S::max_value(),
                };
                SymbolClass::range(lo, hi)
            })
            .collect()
    }
}

impl<S: Symbol, V> Default for Table<S, V> {
    fn default() -> Self {
        Table::new()
    }
}

impl<S: Symbol, V> FromIterator<(S, V)> for Table<S, V> {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Table::from_entries(iter.into_iter().collect())
    }
}
